//! Benchmarks for the per-window consensus work.
//!
//! Measures:
//! - Streaming mean over a full mailbox
//! - Mailbox recording with and without overflow
//! - A complete consensus round

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use photoswarm_consensus::{
    streaming_mean, MixingSchedule, NeighborMailbox, OpinionEstimator, OverflowPolicy,
    DEFAULT_CAPACITY,
};
use photoswarm_wire::PeerId;

fn bench_streaming_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_mean");

    for &len in &[1usize, 5, 21, 100] {
        let values: Vec<f64> = (0..len).map(|i| 400.0 + i as f64).collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &values, |b, v| {
            b.iter(|| streaming_mean(black_box(v).iter().copied()))
        });
    }
    group.finish();
}

fn bench_mailbox_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("mailbox_record");

    for policy in [OverflowPolicy::EvictOldest, OverflowPolicy::DropNewest] {
        group.bench_with_input(
            BenchmarkId::new("peers_256", format!("{policy:?}")),
            &policy,
            |b, &policy| {
                b.iter(|| {
                    let mut mailbox = NeighborMailbox::new(DEFAULT_CAPACITY, policy);
                    for id in 0..=255u8 {
                        mailbox.record(PeerId(id), black_box(f64::from(id)));
                    }
                    mailbox.len()
                })
            },
        );
    }
    group.finish();
}

fn bench_consensus_round(c: &mut Criterion) {
    let schedule = MixingSchedule::default();
    let mut mailbox = NeighborMailbox::default();
    for id in 0..DEFAULT_CAPACITY as u8 {
        mailbox.record(PeerId(id), 500.0 + f64::from(id));
    }

    c.bench_function("consensus_round_full_mailbox", |b| {
        let mut estimator = OpinionEstimator::new();
        estimator.seed([480.0]);
        let mut round = 0u32;
        b.iter(|| {
            round = (round + 1) % schedule.switch_threshold();
            estimator.consensus_round(
                mailbox.values().copied(),
                black_box(470.0),
                schedule.weight(round),
                schedule.beta(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_streaming_mean,
    bench_mailbox_record,
    bench_consensus_round,
);
criterion_main!(benches);
