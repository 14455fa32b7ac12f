//! The phase engine.
//!
//! An [`Agent`] owns every piece of per-robot state. Two entry points mutate
//! it, and the host must never run them concurrently:
//!
//! - [`Agent::on_receive`] for each inbound frame: records the report and
//!   arms a reply, never blocks
//! - [`Agent::step`] from the main loop: window bookkeeping, estimator
//!   updates and motion, may block through [`Clock::pause`]
//!
//! ```text
//!   Dispersion ──all peers settled──▶ Consensus ──round == switch──▶ Chemotaxis
//!       ▲                                  │                              │
//!       └──────── peer reports Dispersing ─┴──────────────────────────────┘
//! ```

mod chemotaxis;
mod consensus;
mod dispersion;

#[cfg(test)]
pub(crate) mod testing;

use photoswarm_consensus::{MixingSchedule, NeighborMailbox, OpinionEstimator, RecordOutcome};
use photoswarm_wire::{FixedOpinion, Message, PeerId, StatusTag};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::hal::{Actuator, Clock, Color, Distance, Hal, Motion, MotionController, Tick};
use crate::outbox::Outbox;
use crate::phase::{Phase, SubPhase};

/// What a neighbor told us this window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Report {
    /// A bare status.
    Status(StatusTag),
    /// An opinion value (the sender was sharing).
    Opinion(f64),
}

impl Report {
    /// The reported opinion, if any.
    pub fn opinion(&self) -> Option<f64> {
        match self {
            Self::Opinion(value) => Some(*value),
            Self::Status(_) => None,
        }
    }

    /// Whether the sender is still spreading out.
    pub fn is_dispersing(&self) -> bool {
        matches!(self, Self::Status(StatusTag::Dispersing))
    }
}

impl From<Message> for Report {
    fn from(message: Message) -> Self {
        match (message.tag, message.opinion) {
            (StatusTag::Sharing, Some(value)) => Self::Opinion(value),
            (tag, _) => Self::Status(tag),
        }
    }
}

/// Running counters, for observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub mailbox_overflows: u64,
    pub regressions: u64,
    pub escapes: u64,
}

/// Point-in-time view of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: PeerId,
    pub phase: Phase,
    pub subphase: SubPhase,
    pub motion: Motion,
    pub posterior: f64,
    pub sensed: f64,
    pub neighbor_consensus: f64,
    pub reference_target: f64,
    pub round: u32,
    pub stuck_counter: u32,
    pub arrived: bool,
}

/// One robot's controller.
#[derive(Debug)]
pub struct Agent {
    id: PeerId,
    config: AgentConfig,
    schedule: MixingSchedule,

    phase: Phase,
    subphase: SubPhase,
    motion: MotionController,

    estimator: OpinionEstimator,
    mailbox: NeighborMailbox<Report>,
    outbox: Outbox,

    /// Light level the robot is steering toward
    reference_target: f64,
    /// Consensus rounds since entering the phase
    round: u32,
    /// Consecutive chemotaxis steps without a usable light change
    stuck_counter: u32,
    last_light: f64,
    last_distance_to_target: f64,
    arrived: bool,

    /// Tick of the last window rollover
    last_window: Tick,
    /// A frame arrived since the last rollover
    heard: bool,
    /// Distance of the most recent frame
    last_peer_distance: Option<Distance>,

    stats: AgentStats,
}

impl Agent {
    /// Create an agent in `Dispersion` / `Dispersing`.
    pub fn new(id: PeerId, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let schedule = config.consensus.schedule()?;

        Ok(Self {
            id,
            schedule,
            phase: Phase::Dispersion,
            subphase: SubPhase::Dispersing,
            motion: MotionController::default(),
            estimator: OpinionEstimator::new(),
            mailbox: NeighborMailbox::new(config.mailbox.capacity, config.mailbox.overflow),
            outbox: Outbox::new(),
            reference_target: 0.0,
            round: 0,
            stuck_counter: 0,
            last_light: 0.0,
            last_distance_to_target: 0.0,
            arrived: false,
            last_window: Tick::default(),
            heard: false,
            last_peer_distance: None,
            stats: AgentStats::default(),
            config,
        })
    }

    /// Power-up: anchor the window clock, wait out the start-up pause and
    /// advertise the initial status so neighbors have something to answer.
    pub fn start<H: Hal>(&mut self, hal: &mut H) {
        self.last_window = hal.now();
        hal.pause(self.config.startup());
        self.arm_status();
        info!(robot = %self.id, "controller started");
    }

    /// One pass of the main loop.
    pub fn step<H: Hal>(&mut self, hal: &mut H) {
        match self.phase {
            Phase::Dispersion => self.disperse(hal),
            Phase::Consensus => {
                self.consense(hal);
                let blink = self.config.consensus.blink();
                hal.pause(blink);
                hal.set_indicator(Color::OFF);
                hal.pause(blink);
            }
            Phase::Chemotaxis => self.navigate(hal),
        }
    }

    /// Handle one received frame.
    ///
    /// Undecodable frames are dropped. Otherwise the sender's report is
    /// recorded and a reply is armed; a `Dispersing` report received after
    /// dispersion pulls this robot back into dispersion.
    pub fn on_receive(&mut self, frame: &[u8], distance: Distance) {
        let message = match Message::decode(frame) {
            Ok(message) => message,
            Err(err) => {
                self.stats.frames_rejected += 1;
                debug!(robot = %self.id, error = %err, "dropping frame");
                return;
            }
        };

        self.stats.frames_received += 1;
        self.heard = true;
        self.last_peer_distance = Some(distance);
        trace!(
            robot = %self.id,
            from = %message.sender,
            tag = %message.tag,
            distance = distance.millimeters(),
            "frame received"
        );

        match self.phase {
            Phase::Dispersion => {
                self.arm_status();
                self.record(message);
            }
            Phase::Consensus | Phase::Chemotaxis => match message.tag {
                StatusTag::Dispersing => self.regress(message.sender),
                StatusTag::Sharing => {
                    self.record(message);
                    self.arm_opinion();
                }
                StatusTag::WaitingForOthers | StatusTag::Disconnected => self.arm_opinion(),
            },
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subphase(&self) -> SubPhase {
        self.subphase
    }

    pub fn motion(&self) -> Motion {
        self.motion.current()
    }

    pub fn estimator(&self) -> &OpinionEstimator {
        &self.estimator
    }

    pub fn posterior(&self) -> f64 {
        self.estimator.posterior()
    }

    pub fn reference_target(&self) -> f64 {
        self.reference_target
    }

    /// Consensus rounds completed since entering consensus.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn stuck_counter(&self) -> u32 {
        self.stuck_counter
    }

    /// Whether the last chemotaxis step found the target light level.
    pub fn is_arrived(&self) -> bool {
        self.arrived
    }

    pub fn mailbox(&self) -> &NeighborMailbox<Report> {
        &self.mailbox
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Transport access: poll and acknowledge the pending frame.
    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            phase: self.phase,
            subphase: self.subphase,
            motion: self.motion.current(),
            posterior: self.estimator.posterior(),
            sensed: self.estimator.sensed(),
            neighbor_consensus: self.estimator.neighbor_consensus(),
            reference_target: self.reference_target,
            round: self.round,
            stuck_counter: self.stuck_counter,
            arrived: self.arrived,
        }
    }

    /// Whether more than `window_ticks` have passed since the last rollover.
    fn window_elapsed(&self, now: Tick, window_ticks: u32) -> bool {
        now.since(self.last_window) > window_ticks
    }

    fn set_motion<H: Hal>(&mut self, hal: &mut H, motion: Motion) {
        self.motion.set(hal, motion);
    }

    fn record(&mut self, message: Message) {
        let outcome = self.mailbox.record(message.sender, Report::from(message));
        if outcome.overflowed() {
            self.stats.mailbox_overflows += 1;
            match outcome {
                RecordOutcome::Evicted(evicted) => warn!(
                    robot = %self.id,
                    from = %message.sender,
                    evicted = %evicted,
                    capacity = self.mailbox.capacity(),
                    "mailbox full, evicted oldest peer"
                ),
                _ => warn!(
                    robot = %self.id,
                    from = %message.sender,
                    capacity = self.mailbox.capacity(),
                    policy = ?self.mailbox.policy(),
                    "mailbox full, dropped report"
                ),
            }
        }
    }

    /// Advertise the current sub-phase.
    fn arm_status(&mut self) {
        match self.subphase.status_tag() {
            StatusTag::Sharing => self.arm_opinion(),
            tag => self.arm(Message::status(self.id, tag)),
        }
    }

    /// Advertise the current opinion, clamped into the wire range.
    fn arm_opinion(&mut self) {
        let opinion = FixedOpinion::saturating_from(self.estimator.posterior()).to_opinion();
        self.arm(Message::sharing(self.id, opinion));
    }

    fn arm(&mut self, message: Message) {
        match message.encode() {
            Ok(payload) => self.outbox.arm(payload),
            Err(err) => warn!(robot = %self.id, error = %err, "cannot encode outgoing frame"),
        }
    }

    /// A neighbor is still dispersing: go back and wait for it.
    fn regress(&mut self, cause: PeerId) {
        info!(
            robot = %self.id,
            from = %self.phase,
            peer = %cause,
            "neighbor still dispersing, returning to dispersion"
        );
        self.phase = Phase::Dispersion;
        self.subphase = SubPhase::WaitingForOthers;
        self.round = 0;
        self.arrived = false;
        self.stats.regressions += 1;
        self.arm_status();
    }
}
