//! End-to-end scenarios: controllers talking to each other, first on the
//! bench with an idealized radio, then in the simulated arena.

use std::time::Duration;

use photoswarm_agent::{AgentConfig, Distance, Motion, Phase, SubPhase};
use photoswarm_integration_tests::{exchange, run_until, BenchRobot};
use photoswarm_sim::{
    LightField, Placement, RadioConfig, Simulation, SimulationConfig, SwarmEvent,
};
use photoswarm_wire::{Message, PeerId, StatusTag};

const SPREAD_OUT: Distance = Distance(80);

fn pair(light_a: u16, light_b: u16) -> Vec<BenchRobot> {
    vec![
        BenchRobot::started(1, light_a, AgentConfig::default()).unwrap(),
        BenchRobot::started(2, light_b, AgentConfig::default()).unwrap(),
    ]
}

fn all_in(phase: Phase) -> impl Fn(&[BenchRobot]) -> bool {
    move |robots| robots.iter().all(|robot| robot.phase() == phase)
}

#[test]
fn spread_out_pair_moves_on_to_consensus() {
    let mut robots = pair(400, 440);

    let steps = run_until(&mut robots, SPREAD_OUT, 500, all_in(Phase::Consensus));

    // One window to learn the neighbor has stopped, one more to agree on it.
    assert!(steps.is_some(), "pair never left dispersion");
    for robot in &robots {
        assert_eq!(robot.agent.round(), 0);
        assert_eq!(robot.agent.stats().regressions, 0);
        assert_eq!(robot.hal.motion, Motion::Stopped);
    }
}

#[test]
fn crowded_pair_keeps_searching() {
    let mut robots = pair(400, 440);

    let steps = run_until(&mut robots, Distance(30), 300, |robots| {
        robots.iter().any(|robot| robot.phase() != Phase::Dispersion)
    });

    assert_eq!(steps, None);
    for robot in &robots {
        assert_eq!(robot.agent.subphase(), SubPhase::Dispersing);
    }
}

#[test]
fn lone_robot_stops_as_disconnected() {
    let mut robots = vec![BenchRobot::started(1, 400, AgentConfig::default()).unwrap()];

    // The power-up status goes out once; with nobody to answer, nothing follows.
    for step in 0..100 {
        let sent = exchange(&mut robots, SPREAD_OUT);
        assert_eq!(sent, usize::from(step == 0), "step {step}");
        robots[0].step(1);
    }
    assert_eq!(robots[0].agent.outbox().dispatched_count(), 1);

    let robot = &robots[0];
    assert_eq!(robot.phase(), Phase::Dispersion);
    assert_eq!(robot.agent.subphase(), SubPhase::Disconnected);
    assert_eq!(robot.hal.motion, Motion::Stopped);
}

#[test]
fn dispersing_newcomer_pulls_the_pair_back() {
    let mut robots = pair(400, 440);
    run_until(&mut robots, SPREAD_OUT, 500, all_in(Phase::Consensus)).unwrap();
    run_until(&mut robots, SPREAD_OUT, 2000, |robots| {
        robots.iter().all(|robot| robot.agent.round() >= 3)
    })
    .unwrap();

    let newcomer = Message::status(PeerId(9), StatusTag::Dispersing)
        .encode()
        .unwrap();
    for robot in &mut robots {
        robot.agent.on_receive(&newcomer, Distance(40));
    }

    for robot in &robots {
        assert_eq!(robot.phase(), Phase::Dispersion);
        assert_eq!(robot.agent.subphase(), SubPhase::WaitingForOthers);
        assert_eq!(robot.agent.round(), 0);
        assert_eq!(robot.agent.stats().regressions, 1);
    }

    // Once the newcomer goes quiet the pair settles again.
    let steps = run_until(&mut robots, SPREAD_OUT, 500, all_in(Phase::Consensus));
    assert!(steps.is_some());
}

#[test]
fn pair_agrees_then_both_arrive() {
    let mut robots = pair(400, 440);

    let steps = run_until(&mut robots, SPREAD_OUT, 20_000, all_in(Phase::Chemotaxis));
    assert!(steps.is_some(), "pair never started navigating");

    for robot in &robots {
        let target = robot.agent.reference_target();
        assert!(
            (399.0..=441.0).contains(&target),
            "target {target} outside the sensed range"
        );
    }

    run_until(&mut robots, SPREAD_OUT, 100, |robots| {
        robots.iter().all(|robot| robot.agent.is_arrived())
    })
    .unwrap();
    for robot in &robots {
        assert_eq!(robot.hal.motion, Motion::Stopped);
        assert_eq!(robot.agent.stats().regressions, 0);
    }
}

#[test]
fn fast_switch_reaches_chemotaxis_quickly() {
    let config = AgentConfig::default().with_switch_threshold(5);
    let mut robots = vec![
        BenchRobot::started(1, 300, config).unwrap(),
        BenchRobot::started(2, 310, config).unwrap(),
        BenchRobot::started(3, 320, config).unwrap(),
    ];

    let steps = run_until(&mut robots, SPREAD_OUT, 2_000, all_in(Phase::Chemotaxis));
    assert!(steps.is_some());
}

fn two_robot_line() -> SimulationConfig {
    SimulationConfig::default()
        .with_placement(Placement::Fixed {
            positions: vec![[460.0, 500.0], [540.0, 500.0]],
        })
        .with_field(LightField::Linear {
            base: 300.0,
            slope_per_mm: 0.5,
        })
        .with_duration(Duration::from_secs(300))
}

#[test]
fn simulated_pair_reaches_consensus() {
    let mut sim = Simulation::new(two_robot_line()).unwrap();
    sim.run_until(20_000);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.phases.dispersion, 0, "{snapshot:?}");
    assert!(sim.radio_stats().delivered > 0);
    assert!(sim.events().iter().any(|event| matches!(
        event,
        SwarmEvent::PhaseChanged {
            to: Phase::Consensus,
            ..
        }
    )));
}

#[test]
fn simulated_pair_navigates_and_arrives() {
    let mut sim = Simulation::new(two_robot_line()).unwrap();
    sim.run();

    let summary = sim.summary();
    assert_eq!(summary.simulated_ms, 300_000);
    assert!(summary.snapshot.all_in(Phase::Chemotaxis), "{summary:?}");
    assert_eq!(summary.snapshot.arrived, 2);
    assert!(summary.first_consensus_ms < summary.first_chemotaxis_ms);

    let spread = summary.snapshot.opinion_spread.unwrap();
    assert!(spread < 40.0, "opinions drifted apart: {spread}");

    let arrivals: Vec<PeerId> = sim
        .events()
        .iter()
        .filter(|event| matches!(event, SwarmEvent::Arrived { .. }))
        .map(SwarmEvent::robot)
        .collect();
    assert!(arrivals.contains(&PeerId(0)));
    assert!(arrivals.contains(&PeerId(1)));
}

#[test]
fn crowded_cluster_spreads_out() {
    let config = SimulationConfig::default()
        .with_robots(8)
        .with_placement(Placement::Cluster { radius_mm: 30.0 })
        .with_seed(3);
    let mut sim = Simulation::new(config).unwrap();
    let initial = sim.snapshot().radius_mm();

    sim.run_until(90_000);

    let snapshot = sim.snapshot();
    assert!(
        snapshot.radius_mm() > initial,
        "radius {} did not grow from {initial}",
        snapshot.radius_mm()
    );
    assert!(snapshot.robots.iter().any(|robot| robot.odometer_mm > 0.0));
}

#[test]
fn dead_radio_leaves_everyone_disconnected() {
    let config = SimulationConfig::default()
        .with_robots(4)
        .with_radio(RadioConfig {
            loss_rate: 1.0,
            ..RadioConfig::default()
        });
    let mut sim = Simulation::new(config).unwrap();
    sim.run_until(10_000);

    let snapshot = sim.snapshot();
    assert!(snapshot.all_in(Phase::Dispersion));
    for robot in &snapshot.robots {
        assert_eq!(robot.agent.subphase, SubPhase::Disconnected);
        assert_eq!(robot.agent.motion, Motion::Stopped);
    }
    assert_eq!(sim.radio_stats().delivered, 0);
}
