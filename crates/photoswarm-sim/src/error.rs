//! Error types for the simulator.

use photoswarm_agent::ConfigError;
use thiserror::Error;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file is not valid JSON for [`SimulationConfig`](crate::SimulationConfig)
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override could not be parsed
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// The arena or swarm layout cannot be simulated
    #[error("Invalid arena: {0}")]
    InvalidArena(String),

    /// The controller configuration was rejected
    #[error("Invalid controller config: {0}")]
    Agent(#[from] ConfigError),
}
