//! Error types for photoswarm-agent.
//!
//! The control loop itself never fails: lost neighbors, mailbox overflow and
//! stalled searches are handled locally. Only building an agent from a bad
//! configuration is fallible.

use photoswarm_consensus::ScheduleError;
use thiserror::Error;

/// Result type for configuration checks.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A configuration the controller cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The consensus weights are inconsistent.
    #[error("invalid mixing schedule: {0}")]
    Schedule(#[from] ScheduleError),

    /// The mailbox could not hold a single neighbor.
    #[error("mailbox capacity must be positive")]
    ZeroCapacity,

    /// A window would roll over on every step.
    #[error("{0} window must span at least one tick")]
    ZeroWindow(&'static str),

    /// The first opinion would have no samples behind it.
    #[error("at least one initial light sample is required")]
    NoInitialSamples,

    /// A chemotaxis threshold is negative or not a number.
    #[error("invalid {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}
