//! Simulation configuration.
//!
//! A config is read from a JSON file (missing fields fall back to their
//! defaults) and then selectively overridden from `PHOTOSWARM_*`
//! environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `PHOTOSWARM_CONFIG` | JSON file to start from |
//! | `PHOTOSWARM_SEED` | `seed` |
//! | `PHOTOSWARM_ROBOTS` | `robots` |
//! | `PHOTOSWARM_DURATION_MS` | `duration_ms` |
//! | `PHOTOSWARM_ARENA_MM` | `arena.size_mm` |
//! | `PHOTOSWARM_RADIO_RANGE_MM` | `radio.range_mm` |
//! | `PHOTOSWARM_LOSS_RATE` | `radio.loss_rate` |

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use photoswarm_agent::AgentConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::LightField;
use crate::radio::RadioConfig;
use crate::robot::{Arena, BODY_RADIUS_MM};

/// Robot ids are one byte on the wire.
pub const MAX_ROBOTS: usize = 256;

/// Where robots are put at the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Uniformly inside a disk around the arena center.
    Cluster { radius_mm: f64 },
    /// Explicit positions; the robot count follows the list.
    Fixed { positions: Vec<[f64; 2]> },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Cluster { radius_mm: 80.0 }
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for deterministic runs
    pub seed: u64,
    /// Swarm size (ignored for fixed placements)
    pub robots: usize,
    /// How long [`Simulation::run`](crate::Simulation::run) simulates
    pub duration_ms: u64,
    pub arena: Arena,
    pub placement: Placement,
    pub radio: RadioConfig,
    /// Time one pass of the control loop takes on its own
    pub loop_ms: u64,
    /// Robots power up at random times within this span
    pub start_jitter_ms: u64,
    /// Tick counters start at a random value below this
    pub max_clock_offset: u32,
    /// Controller configuration shared by every robot
    pub agent: AgentConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            robots: 12,
            duration_ms: 600_000,
            arena: Arena::default(),
            placement: Placement::default(),
            radio: RadioConfig::default(),
            loop_ms: 20,
            start_jitter_ms: 1000,
            max_clock_offset: 1024,
            agent: AgentConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("PHOTOSWARM_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(seed) = parse_var(&lookup, "PHOTOSWARM_SEED")? {
            config.seed = seed;
        }
        if let Some(robots) = parse_var(&lookup, "PHOTOSWARM_ROBOTS")? {
            config.robots = robots;
        }
        if let Some(duration) = parse_var(&lookup, "PHOTOSWARM_DURATION_MS")? {
            config.duration_ms = duration;
        }
        if let Some(size) = parse_var(&lookup, "PHOTOSWARM_ARENA_MM")? {
            config.arena.size_mm = size;
        }
        if let Some(range) = parse_var(&lookup, "PHOTOSWARM_RADIO_RANGE_MM")? {
            config.radio.range_mm = range;
        }
        if let Some(loss) = parse_var(&lookup, "PHOTOSWARM_LOSS_RATE")? {
            config.radio.loss_rate = loss;
        }

        Ok(config)
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the swarm size for a cluster placement.
    #[must_use]
    pub fn with_robots(mut self, robots: usize) -> Self {
        self.robots = robots;
        self
    }

    /// Set the run length.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Set the initial placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the light field.
    #[must_use]
    pub fn with_field(mut self, field: LightField) -> Self {
        self.arena.field = field;
        self
    }

    /// Set the radio parameters.
    #[must_use]
    pub fn with_radio(mut self, radio: RadioConfig) -> Self {
        self.radio = radio;
        self
    }

    /// Set the controller configuration.
    #[must_use]
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    /// Number of robots this config places.
    pub fn robot_count(&self) -> usize {
        match &self.placement {
            Placement::Cluster { .. } => self.robots,
            Placement::Fixed { positions } => positions.len(),
        }
    }

    /// Check the arena, the radio and the controller config.
    pub fn validate(&self) -> Result<()> {
        let size = self.arena.size_mm;
        if !size.is_finite() || size <= 2.0 * BODY_RADIUS_MM {
            return Err(Error::InvalidArena(format!("arena size {size} mm is too small")));
        }

        let count = self.robot_count();
        if count == 0 || count > MAX_ROBOTS {
            return Err(Error::InvalidArena(format!(
                "swarm size {count} outside 1..={MAX_ROBOTS}"
            )));
        }

        match &self.placement {
            Placement::Cluster { radius_mm } => {
                if !radius_mm.is_finite() || *radius_mm < 0.0 || *radius_mm > size / 2.0 {
                    return Err(Error::InvalidArena(format!(
                        "cluster radius {radius_mm} mm does not fit the arena"
                    )));
                }
            }
            Placement::Fixed { positions } => {
                if let Some([x, y]) = positions
                    .iter()
                    .find(|[x, y]| !(0.0..=size).contains(x) || !(0.0..=size).contains(y))
                {
                    return Err(Error::InvalidArena(format!(
                        "position ({x}, {y}) is outside the arena"
                    )));
                }
            }
        }

        let radio = &self.radio;
        if !radio.range_mm.is_finite() || radio.range_mm <= 0.0 {
            return Err(Error::InvalidArena(format!("radio range {} mm", radio.range_mm)));
        }
        if !(0.0..=1.0).contains(&radio.loss_rate) {
            return Err(Error::InvalidArena(format!("loss rate {}", radio.loss_rate)));
        }
        if radio.tx_period_ms == 0 || radio.inbox_depth == 0 || self.loop_ms == 0 {
            return Err(Error::InvalidArena(
                "tx period, inbox depth and loop time must be positive".to_string(),
            ));
        }

        self.agent.validate()?;
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidEnv { name, value }),
    }
}
