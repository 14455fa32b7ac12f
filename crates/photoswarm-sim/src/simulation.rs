//! Discrete-event swarm simulation with event recording.
//!
//! Every robot runs on its own clock. The scheduler always advances the
//! robot (or radio slot) that is furthest behind, so a robot stuck in a
//! long pause simply falls silent for that long while the rest of the swarm
//! keeps going:
//!
//! ```text
//!   due = min(robot clocks, transmit slots)
//!   transmit slot  → broadcast the pending frame, acknowledge it
//!   robot clock    → drain inbox, run one control step, charge loop time
//! ```

use std::f64::consts::TAU;
use std::time::Duration;

use photoswarm_agent::{inbox, Agent, Clock, Inbox, InboxSender, Phase, SubPhase};
use photoswarm_wire::PeerId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Placement, SimulationConfig};
use crate::error::Result;
use crate::events::{RobotState, SwarmEvent, SwarmSnapshot};
use crate::radio::{Radio, RadioStats};
use crate::robot::{Pose, SimRobot};

/// What the timeline last saw of a robot.
#[derive(Debug, Clone, Copy)]
struct Observed {
    phase: Phase,
    subphase: SubPhase,
    arrived: bool,
    regressions: u64,
    escapes: u64,
}

impl Observed {
    fn of(agent: &Agent) -> Self {
        let stats = agent.stats();
        Self {
            phase: agent.phase(),
            subphase: agent.subphase(),
            arrived: agent.is_arrived(),
            regressions: stats.regressions,
            escapes: stats.escapes,
        }
    }
}

#[derive(Debug)]
struct Member {
    agent: Agent,
    robot: SimRobot,
    sender: InboxSender,
    inbox: Inbox,
    started: bool,
    next_tx_ms: u64,
    observed: Observed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    // Transmissions sort first so frames sent at `t` are seen by steps at `t`
    Transmit,
    Step,
}

/// Outcome of a run, as printed by the `photoswarm-sim` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub seed: u64,
    pub robots: usize,
    pub simulated_ms: u64,
    pub events: usize,
    pub regressions: usize,
    pub escapes: usize,
    /// First time any robot entered consensus
    pub first_consensus_ms: Option<u64>,
    /// First time any robot started navigating
    pub first_chemotaxis_ms: Option<u64>,
    /// Frames the controllers armed, superseded ones included
    pub frames_armed: u64,
    /// Frames that actually went on air
    pub frames_sent: u64,
    pub snapshot: SwarmSnapshot,
}

/// A swarm of controllers in a simulated arena.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    members: Vec<Member>,
    radio: Radio,
    events: Vec<SwarmEvent>,
    now_ms: u64,
}

impl Simulation {
    /// Place the swarm. Nothing runs until [`run_until`](Self::run_until).
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let positions: Vec<[f64; 2]> = match &config.placement {
            Placement::Cluster { radius_mm } => {
                let [cx, cy] = config.arena.center();
                (0..config.robots)
                    .map(|_| {
                        let r = radius_mm * rng.gen::<f64>().sqrt();
                        let angle = rng.gen_range(0.0..TAU);
                        [cx + r * angle.cos(), cy + r * angle.sin()]
                    })
                    .collect()
            }
            Placement::Fixed { positions } => positions.clone(),
        };

        let members = positions
            .into_iter()
            .enumerate()
            .map(|(index, [x, y])| -> Result<Member> {
                let heading = rng.gen_range(0.0..TAU);
                let start_ms = rng.gen_range(0..=config.start_jitter_ms);
                let clock_offset = rng.gen_range(0..config.max_clock_offset.max(1));
                let robot = SimRobot::new(
                    Pose { x, y, heading },
                    start_ms,
                    clock_offset,
                    config.arena,
                    StdRng::seed_from_u64(rng.gen()),
                );
                let agent = Agent::new(PeerId(index as u8), config.agent)?;
                let (sender, inbox) = inbox(config.radio.inbox_depth);

                Ok(Member {
                    observed: Observed::of(&agent),
                    agent,
                    robot,
                    sender,
                    inbox,
                    started: false,
                    next_tx_ms: start_ms + rng.gen_range(0..config.radio.tx_period_ms),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let radio = Radio::new(config.radio, StdRng::seed_from_u64(rng.gen()));
        info!(robots = members.len(), seed = config.seed, "swarm placed");

        Ok(Self {
            config,
            members,
            radio,
            events: Vec::new(),
            now_ms: 0,
        })
    }

    /// Run for the configured duration.
    pub fn run(&mut self) {
        self.run_until(self.config.duration_ms);
    }

    /// Process everything due up to and including `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) {
        while let Some((at_ms, due, index)) = self.next_due() {
            if at_ms > end_ms {
                break;
            }
            self.now_ms = at_ms;
            match due {
                Due::Transmit => self.transmit(index),
                Due::Step => self.step(index),
            }
        }
        self.now_ms = self.now_ms.max(end_ms);
    }

    fn next_due(&self) -> Option<(u64, Due, usize)> {
        self.members
            .iter()
            .enumerate()
            .flat_map(|(index, member)| {
                [
                    (member.next_tx_ms, Due::Transmit, index),
                    (member.robot.elapsed_ms(), Due::Step, index),
                ]
            })
            .min()
    }

    fn transmit(&mut self, index: usize) {
        let member = &mut self.members[index];
        member.next_tx_ms += self.config.radio.tx_period_ms;
        let Some(frame) = member.agent.outbox().poll() else {
            return;
        };
        let origin = member.robot.pose();

        let receivers = self
            .members
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, member)| (member.robot.pose(), &member.sender));
        self.radio.broadcast(frame, origin, receivers);

        self.members[index].agent.outbox_mut().acknowledge();
    }

    fn step(&mut self, index: usize) {
        let at_ms = self.now_ms;
        let member = &mut self.members[index];
        member.inbox.drain_into(&mut member.agent);

        if member.started {
            member.agent.step(&mut member.robot);
        } else {
            member.agent.start(&mut member.robot);
            member.started = true;
            self.events.push(SwarmEvent::Started {
                robot: member.agent.id(),
                at_ms,
            });
        }
        member
            .robot
            .pause(Duration::from_millis(self.config.loop_ms));

        self.observe(index, at_ms);
    }

    /// Turn state changes since the last step into timeline events.
    fn observe(&mut self, index: usize, at_ms: u64) {
        let member = &mut self.members[index];
        let robot = member.agent.id();
        let before = member.observed;
        let now = Observed::of(&member.agent);
        member.observed = now;

        if now.regressions > before.regressions {
            self.events.push(SwarmEvent::Regressed { robot, at_ms });
        }
        if now.phase != before.phase {
            debug!(robot = %robot, from = %before.phase, to = %now.phase, at_ms, "phase change");
            self.events.push(SwarmEvent::PhaseChanged {
                robot,
                from: before.phase,
                to: now.phase,
                at_ms,
            });
        }
        if now.subphase != before.subphase {
            self.events.push(SwarmEvent::SubPhaseChanged {
                robot,
                from: before.subphase,
                to: now.subphase,
                at_ms,
            });
        }
        if now.arrived && !before.arrived {
            self.events.push(SwarmEvent::Arrived {
                robot,
                target: member.agent.reference_target(),
                light: member.robot.light_level(),
                at_ms,
            });
        }
        if now.escapes > before.escapes {
            self.events.push(SwarmEvent::Escaped { robot, at_ms });
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulation time reached so far.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn robot_count(&self) -> usize {
        self.members.len()
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.members.get(index).map(|member| &member.agent)
    }

    pub fn robot(&self, index: usize) -> Option<&SimRobot> {
        self.members.get(index).map(|member| &member.robot)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.members.iter().map(|member| &member.agent)
    }

    /// Get all recorded events.
    pub fn events(&self) -> &[SwarmEvent] {
        &self.events
    }

    pub fn radio_stats(&self) -> RadioStats {
        self.radio.stats()
    }

    /// Get a snapshot of the swarm at the current state.
    pub fn snapshot(&self) -> SwarmSnapshot {
        let robots = self
            .members
            .iter()
            .map(|member| RobotState {
                agent: member.agent.snapshot(),
                pose: member.robot.pose(),
                led: member.robot.led(),
                light: member.robot.light_level(),
                odometer_mm: member.robot.odometer_mm(),
            })
            .collect();
        SwarmSnapshot::new(self.now_ms, robots, self.radio.stats())
    }

    /// Condense the run so far.
    pub fn summary(&self) -> Summary {
        let first_entry = |phase: Phase| {
            self.events.iter().find_map(|event| match event {
                SwarmEvent::PhaseChanged { to, at_ms, .. } if *to == phase => Some(*at_ms),
                _ => None,
            })
        };
        let count = |pred: fn(&SwarmEvent) -> bool| self.events.iter().filter(|e| pred(e)).count();

        Summary {
            seed: self.config.seed,
            robots: self.members.len(),
            simulated_ms: self.now_ms,
            events: self.events.len(),
            regressions: count(|e| matches!(e, SwarmEvent::Regressed { .. })),
            escapes: count(|e| matches!(e, SwarmEvent::Escaped { .. })),
            first_consensus_ms: first_entry(Phase::Consensus),
            first_chemotaxis_ms: first_entry(Phase::Chemotaxis),
            frames_armed: self.agents().map(|a| a.outbox().armed_count()).sum(),
            frames_sent: self.agents().map(|a| a.outbox().dispatched_count()).sum(),
            snapshot: self.snapshot(),
        }
    }
}
