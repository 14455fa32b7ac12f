//! Short-range broadcast radio.
//!
//! Every transmission reaches each robot within range, subject to random
//! loss. The receiver gets the frame together with a distance estimate:
//! the true separation plus uniform noise, the way signal-strength ranging
//! behaves on the real hardware.

use photoswarm_agent::{Distance, InboxSender, DEFAULT_INBOX_DEPTH};
use photoswarm_wire::Payload;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::robot::Pose;

/// Radio parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Farthest separation at which frames are received
    pub range_mm: f64,
    /// Half-width of the uniform noise on distance estimates
    pub distance_noise_mm: f64,
    /// Interval between transmission opportunities per robot
    pub tx_period_ms: u64,
    /// Probability that a single delivery is lost
    pub loss_rate: f64,
    /// Frames buffered per robot between two control steps
    pub inbox_depth: usize,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            range_mm: 100.0,
            distance_noise_mm: 3.0,
            tx_period_ms: 500,
            loss_rate: 0.0,
            inbox_depth: DEFAULT_INBOX_DEPTH,
        }
    }
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioStats {
    pub broadcasts: u64,
    pub delivered: u64,
    pub lost: u64,
    /// Frames dropped because the receiver's inbox was full
    pub overflowed: u64,
}

/// The shared medium.
#[derive(Debug)]
pub struct Radio {
    config: RadioConfig,
    rng: StdRng,
    stats: RadioStats,
}

impl Radio {
    pub fn new(config: RadioConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            stats: RadioStats::default(),
        }
    }

    pub fn stats(&self) -> RadioStats {
        self.stats
    }

    /// Distance a receiver would report for a true `separation`, or `None`
    /// when the frame does not get through.
    pub fn measure(&mut self, separation: f64) -> Option<Distance> {
        if separation > self.config.range_mm {
            return None;
        }
        if self.config.loss_rate > 0.0 && self.rng.gen::<f64>() < self.config.loss_rate {
            self.stats.lost += 1;
            return None;
        }
        let noise = self.config.distance_noise_mm.abs();
        let estimate = separation + self.rng.gen_range(-noise..=noise);
        Some(Distance(estimate.round().clamp(0.0, f64::from(u16::MAX)) as u16))
    }

    /// Send `frame` from `origin` to every receiver in range.
    ///
    /// Returns how many receivers accepted the frame.
    pub fn broadcast<'a, I>(&mut self, frame: Payload, origin: Pose, receivers: I) -> usize
    where
        I: IntoIterator<Item = (Pose, &'a InboxSender)>,
    {
        self.stats.broadcasts += 1;
        let mut accepted = 0;

        for (pose, inbox) in receivers {
            let Some(distance) = self.measure(origin.distance_to(&pose)) else {
                continue;
            };
            if inbox.deliver(frame, distance) {
                accepted += 1;
            } else {
                self.stats.overflowed += 1;
            }
        }

        self.stats.delivered += accepted as u64;
        trace!(sender = frame[0], accepted, "broadcast");
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoswarm_agent::inbox;
    use rand::SeedableRng;

    fn radio(config: RadioConfig) -> Radio {
        Radio::new(config, StdRng::seed_from_u64(11))
    }

    fn at(x: f64) -> Pose {
        Pose {
            x,
            y: 0.0,
            heading: 0.0,
        }
    }

    #[test]
    fn out_of_range_is_silent() {
        let mut radio = radio(RadioConfig::default());
        assert_eq!(radio.measure(100.5), None);
        assert!(radio.measure(99.0).is_some());
    }

    #[test]
    fn estimates_stay_within_noise() {
        let mut radio = radio(RadioConfig::default());
        for _ in 0..200 {
            let Distance(mm) = radio.measure(80.0).unwrap();
            assert!((77..=83).contains(&mm));
        }
    }

    #[test]
    fn total_loss_delivers_nothing() {
        let mut radio = radio(RadioConfig {
            loss_rate: 1.0,
            ..RadioConfig::default()
        });
        assert_eq!(radio.measure(10.0), None);
        assert_eq!(radio.stats().lost, 1);
    }

    #[test]
    fn broadcast_reaches_only_neighbors_in_range() {
        let mut radio = radio(RadioConfig {
            distance_noise_mm: 0.0,
            ..RadioConfig::default()
        });
        let (near_tx, mut near_rx) = inbox(4);
        let (far_tx, mut far_rx) = inbox(4);

        let accepted = radio.broadcast(
            [1, 0xAA, 0, 0, 0, 0],
            at(0.0),
            [(at(70.0), &near_tx), (at(300.0), &far_tx)],
        );

        assert_eq!(accepted, 1);
        assert_eq!(near_rx.try_next().map(|f| f.distance), Some(Distance(70)));
        assert_eq!(far_rx.try_next(), None);
        assert_eq!(radio.stats().delivered, 1);
    }

    #[test]
    fn full_inbox_is_counted() {
        let mut radio = radio(RadioConfig::default());
        let (tx, _rx) = inbox(1);

        radio.broadcast([1, 0xAA, 0, 0, 0, 0], at(0.0), [(at(10.0), &tx)]);
        radio.broadcast([1, 0xAA, 0, 0, 0, 0], at(0.0), [(at(10.0), &tx)]);

        assert_eq!(radio.stats().delivered, 1);
        assert_eq!(radio.stats().overflowed, 1);
    }
}
