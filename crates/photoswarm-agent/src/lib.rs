//! Onboard Controller for Light-Seeking Swarms
//!
//! Each robot runs one [`Agent`]. Robots only see their neighbors through a
//! short-range radio that reports a rough distance with every frame, and
//! only see the world through an ambient light sensor. From that alone the
//! swarm:
//!
//! 1. **Disperses** until every robot is far enough from the others
//! 2. **Agrees** on a light level by repeated neighbor averaging
//! 3. **Navigates** toward places where the light matches the agreed level
//!
//! # Driving an Agent
//!
//! ```text
//!   radio rx ──▶ Inbox ──drain──▶ Agent::on_receive
//!                                      │
//!   main loop ───────────────────▶ Agent::step(&mut hal)
//!                                      │
//!   radio tx ◀── Outbox::poll ◀────────┘
//! ```
//!
//! The host supplies motors, LED, light sensor, clock and random source
//! through the traits in [`hal`]. Everything else (windows, mailbox,
//! estimator, motion) lives inside the agent.
//!
//! # Regression
//!
//! Hearing a neighbor that is still dispersing pulls a robot out of
//! consensus or chemotaxis and back into dispersion. A late arrival can
//! therefore restart agreement for its neighborhood, but never corrupt it.

pub mod config;
mod engine;
mod error;
pub mod hal;
mod inbox;
mod outbox;
mod phase;

pub use config::{
    AgentConfig, ChemotaxisConfig, ConsensusConfig, DispersionConfig, MailboxConfig, PivotStrategy,
};
pub use engine::{Agent, AgentSnapshot, AgentStats, Report};
pub use error::{ConfigError, Result};
pub use hal::{
    Actuator, Clock, Color, Distance, Entropy, Hal, LightSensor, Motion, Tick, TICKS_PER_SECOND,
};
pub use inbox::{inbox, Inbound, Inbox, InboxSender, DEFAULT_INBOX_DEPTH};
pub use outbox::Outbox;
pub use phase::{Phase, SubPhase};
