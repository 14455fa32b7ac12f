//! Swarm timeline events and snapshots.

use photoswarm_agent::{AgentSnapshot, Color, Phase, SubPhase};
use photoswarm_wire::PeerId;
use serde::{Deserialize, Serialize};

use crate::radio::RadioStats;
use crate::robot::Pose;

/// Things worth recording while a swarm runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SwarmEvent {
    /// A robot powered up
    Started { robot: PeerId, at_ms: u64 },

    /// A robot moved to another phase
    PhaseChanged {
        robot: PeerId,
        from: Phase,
        to: Phase,
        at_ms: u64,
    },

    /// A robot changed sub-phase within or across phases
    SubPhaseChanged {
        robot: PeerId,
        from: SubPhase,
        to: SubPhase,
        at_ms: u64,
    },

    /// A robot heard a dispersing neighbor and fell back to dispersion
    Regressed { robot: PeerId, at_ms: u64 },

    /// A robot found its target light level
    Arrived {
        robot: PeerId,
        target: f64,
        light: f64,
        at_ms: u64,
    },

    /// A robot ran its stall escape maneuver
    Escaped { robot: PeerId, at_ms: u64 },
}

impl SwarmEvent {
    /// Simulation time of the event.
    pub fn at_ms(&self) -> u64 {
        match self {
            SwarmEvent::Started { at_ms, .. } => *at_ms,
            SwarmEvent::PhaseChanged { at_ms, .. } => *at_ms,
            SwarmEvent::SubPhaseChanged { at_ms, .. } => *at_ms,
            SwarmEvent::Regressed { at_ms, .. } => *at_ms,
            SwarmEvent::Arrived { at_ms, .. } => *at_ms,
            SwarmEvent::Escaped { at_ms, .. } => *at_ms,
        }
    }

    /// Robot the event is about.
    pub fn robot(&self) -> PeerId {
        match self {
            SwarmEvent::Started { robot, .. }
            | SwarmEvent::PhaseChanged { robot, .. }
            | SwarmEvent::SubPhaseChanged { robot, .. }
            | SwarmEvent::Regressed { robot, .. }
            | SwarmEvent::Arrived { robot, .. }
            | SwarmEvent::Escaped { robot, .. } => *robot,
        }
    }
}

/// One robot at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    #[serde(flatten)]
    pub agent: AgentSnapshot,
    pub pose: Pose,
    pub led: Color,
    /// Noise-free light under the robot
    pub light: f64,
    pub odometer_mm: f64,
}

/// Robots per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub dispersion: usize,
    pub consensus: usize,
    pub chemotaxis: usize,
}

/// The whole swarm at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    pub at_ms: u64,
    pub robots: Vec<RobotState>,
    pub phases: PhaseCounts,
    pub arrived: usize,
    /// Mean opinion of robots past dispersion
    pub mean_opinion: Option<f64>,
    /// Largest opinion gap among robots past dispersion
    pub opinion_spread: Option<f64>,
    pub radio: RadioStats,
}

impl SwarmSnapshot {
    /// Summarize `robots` at `at_ms`.
    pub fn new(at_ms: u64, robots: Vec<RobotState>, radio: RadioStats) -> Self {
        let mut phases = PhaseCounts::default();
        for robot in &robots {
            match robot.agent.phase {
                Phase::Dispersion => phases.dispersion += 1,
                Phase::Consensus => phases.consensus += 1,
                Phase::Chemotaxis => phases.chemotaxis += 1,
            }
        }

        let opinions: Vec<f64> = robots
            .iter()
            .filter(|robot| robot.agent.phase != Phase::Dispersion)
            .map(|robot| robot.agent.posterior)
            .collect();
        let mean_opinion =
            (!opinions.is_empty()).then(|| opinions.iter().sum::<f64>() / opinions.len() as f64);
        let opinion_spread = opinions
            .iter()
            .copied()
            .fold(None, |acc: Option<(f64, f64)>, value| match acc {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })
            .map(|(lo, hi)| hi - lo);

        Self {
            at_ms,
            arrived: robots.iter().filter(|robot| robot.agent.arrived).count(),
            robots,
            phases,
            mean_opinion,
            opinion_spread,
            radio,
        }
    }

    /// Whether every robot is in `phase`.
    pub fn all_in(&self, phase: Phase) -> bool {
        self.robots.iter().all(|robot| robot.agent.phase == phase)
    }

    /// Largest distance of any robot from the swarm's centroid.
    pub fn radius_mm(&self) -> f64 {
        if self.robots.is_empty() {
            return 0.0;
        }
        let n = self.robots.len() as f64;
        let cx = self.robots.iter().map(|r| r.pose.x).sum::<f64>() / n;
        let cy = self.robots.iter().map(|r| r.pose.y).sum::<f64>() / n;
        self.robots
            .iter()
            .map(|r| (r.pose.x - cx).hypot(r.pose.y - cy))
            .fold(0.0, f64::max)
    }
}
