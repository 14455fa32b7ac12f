//! Controller configuration.
//!
//! Defaults reproduce the tuning of the legacy Kilobot firmware. Durations
//! are stored as milliseconds so configs read naturally as JSON.

use std::time::Duration;

use photoswarm_consensus::{MixingSchedule, OverflowPolicy, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Neighbor mailbox sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Distinct peers kept per window
    pub capacity: usize,
    /// What happens to peers beyond capacity
    pub overflow: OverflowPolicy,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::EvictOldest,
        }
    }
}

/// Dispersion tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersionConfig {
    /// Ticks per liveness window (~1 s)
    pub window_ticks: u32,
    /// Estimated peer distance (mm) above which a robot counts as spread out
    pub separation_threshold: u16,
}

impl Default for DispersionConfig {
    fn default() -> Self {
        Self {
            window_ticks: 32,
            separation_threshold: 60,
        }
    }
}

/// Consensus tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Ticks per averaging window
    pub window_ticks: u32,
    /// Sensor samples averaged into the first opinion
    pub initial_samples: u32,
    /// Memory weight on the previous opinion
    pub beta: f64,
    /// Neighbor weight at round zero
    pub base_weight: f64,
    /// Rounds over which the neighbor weight ramps
    pub ramp_rounds: u32,
    /// Neighbor weight once the ramp is over
    pub exploit_weight: f64,
    /// Round at which the robot starts navigating
    pub switch_threshold: u32,
    /// Pause after the initial measurement
    pub settle_ms: u64,
    /// LED blink half-period between consensus steps
    pub blink_ms: u64,
    /// Opinion units per LED color band
    pub band_width: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            window_ticks: 40,
            initial_samples: 20,
            beta: 0.01,
            base_weight: 0.6,
            ramp_rounds: 20,
            exploit_weight: 0.99,
            switch_threshold: 100,
            settle_ms: 1500,
            blink_ms: 50,
            band_width: 125,
        }
    }
}

impl ConsensusConfig {
    /// The weight schedule these values describe.
    pub fn schedule(&self) -> Result<MixingSchedule> {
        Ok(MixingSchedule::new(
            self.beta,
            self.base_weight,
            self.ramp_rounds,
            self.exploit_weight,
            self.switch_threshold,
        )?)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }
}

/// Direction taken when the light gradient points the wrong way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotStrategy {
    /// Legacy behavior: always pivot right.
    #[default]
    AlwaysRight,
    /// Always pivot left.
    AlwaysLeft,
    /// Pick a side with a fair coin.
    Random,
}

/// Chemotaxis tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemotaxisConfig {
    /// Ticks per drift-compensation window
    pub window_ticks: u32,
    /// Light distance below which the robot has arrived
    pub arrival_threshold: f64,
    /// Light change that counts as a usable gradient signal
    pub sensitivity: f64,
    /// Forward run between two decisions
    pub step_ms: u64,
    /// Pivot duration when turning away from a worsening gradient
    pub pivot_ms: u64,
    /// Consecutive flat steps before the escape maneuver
    pub stall_threshold: u32,
    /// Full-power burst at the start of an escape
    pub escape_spin_ms: u64,
    /// Escape pivots right when the random byte is below this value
    pub escape_right_below: u8,
    /// Pivot side for a worsening gradient
    pub pivot: PivotStrategy,
}

impl Default for ChemotaxisConfig {
    fn default() -> Self {
        Self {
            window_ticks: 40,
            arrival_threshold: 50.0,
            sensitivity: 20.0,
            step_ms: 200,
            pivot_ms: 2000,
            stall_threshold: 40,
            escape_spin_ms: 400,
            escape_right_below: 180,
            pivot: PivotStrategy::AlwaysRight,
        }
    }
}

impl ChemotaxisConfig {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    pub fn pivot_pause(&self) -> Duration {
        Duration::from_millis(self.pivot_ms)
    }

    pub fn escape_spin(&self) -> Duration {
        Duration::from_millis(self.escape_spin_ms)
    }

    /// Settle time after arriving: ten forward runs.
    pub fn arrival_settle(&self) -> Duration {
        self.step() * 10
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub mailbox: MailboxConfig,
    pub dispersion: DispersionConfig,
    pub consensus: ConsensusConfig,
    pub chemotaxis: ChemotaxisConfig,
    /// Pause between power-up and the first control step
    pub startup_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mailbox: MailboxConfig::default(),
            dispersion: DispersionConfig::default(),
            consensus: ConsensusConfig::default(),
            chemotaxis: ChemotaxisConfig::default(),
            startup_ms: 2000,
        }
    }
}

impl AgentConfig {
    /// Set the mailbox capacity.
    #[must_use]
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox.capacity = capacity;
        self
    }

    /// Set the mailbox overflow policy.
    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.mailbox.overflow = policy;
        self
    }

    /// Set the dispersion separation threshold.
    #[must_use]
    pub fn with_separation_threshold(mut self, millimeters: u16) -> Self {
        self.dispersion.separation_threshold = millimeters;
        self
    }

    /// Set the number of consensus rounds before navigating.
    #[must_use]
    pub fn with_switch_threshold(mut self, rounds: u32) -> Self {
        self.consensus.switch_threshold = rounds;
        self
    }

    /// Set the pivot strategy for a worsening gradient.
    #[must_use]
    pub fn with_pivot(mut self, pivot: PivotStrategy) -> Self {
        self.chemotaxis.pivot = pivot;
        self
    }

    /// Set the start-up pause.
    #[must_use]
    pub fn with_startup(mut self, duration: Duration) -> Self {
        self.startup_ms = duration.as_millis() as u64;
        self
    }

    pub fn startup(&self) -> Duration {
        Duration::from_millis(self.startup_ms)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if self.mailbox.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.dispersion.window_ticks == 0 {
            return Err(ConfigError::ZeroWindow("dispersion"));
        }
        if self.consensus.window_ticks == 0 {
            return Err(ConfigError::ZeroWindow("consensus"));
        }
        if self.chemotaxis.window_ticks == 0 {
            return Err(ConfigError::ZeroWindow("chemotaxis"));
        }
        if self.consensus.initial_samples == 0 {
            return Err(ConfigError::NoInitialSamples);
        }
        for (name, value) in [
            ("arrival threshold", self.chemotaxis.arrival_threshold),
            ("sensitivity", self.chemotaxis.sensitivity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        self.consensus.schedule()?;
        Ok(())
    }
}
