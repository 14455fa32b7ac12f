//! Adaptive mixing weight for consensus rounds.
//!
//! The weight on the neighbor mean starts at `base_weight` and ramps
//! linearly with the round count:
//!
//! ```text
//! w(k) = base_weight + ramp_gain · min(k, s) / s     k < ramp_rounds
//! w(k) = exploit_weight                               k ≥ ramp_rounds
//! ramp_gain = 1 − beta − base_weight,  s = switch_threshold
//! ```
//!
//! Consensus ends at round `s`, so the ramp never climbs past its value
//! there. A short consensus phase reaches full neighbor trust at the switch.
//!
//! The sensor term gets whatever is left: `1 − beta − w(k)`. With the
//! defaults this moves from 0.39 to 0 as the swarm starts trusting its
//! neighbors over fresh single-point readings.

use thiserror::Error;

/// Errors in a mixing schedule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// A weight lies outside `[0, 1]`.
    #[error("{name} = {value} is outside [0, 1]")]
    WeightOutOfRange { name: &'static str, value: f64 },

    /// Memory and base weights leave no room for the sensor.
    #[error("beta ({beta}) + base weight ({base}) exceeds 1")]
    WeightsExceedUnity { beta: f64, base: f64 },

    /// The exploitation weight would make the sensor weight negative.
    #[error("exploit weight {exploit} exceeds 1 - beta ({limit})")]
    ExploitTooLarge { exploit: f64, limit: f64 },

    /// The ramp ends above the exploitation weight.
    #[error("ramp peaks at {peak}, above exploit weight {exploit}")]
    RampOvershoot { peak: f64, exploit: f64 },

    /// Consensus would end before it starts.
    #[error("switch threshold must be positive")]
    ZeroSwitchThreshold,
}

const TOLERANCE: f64 = 1e-12;

/// Weight schedule for the consensus phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixingSchedule {
    beta: f64,
    base_weight: f64,
    ramp_rounds: u32,
    exploit_weight: f64,
    switch_threshold: u32,
}

impl MixingSchedule {
    /// Build and check a schedule.
    ///
    /// The ramp must stay at or below `exploit_weight` over the rounds it
    /// covers, which keeps the weight non-decreasing across rounds.
    pub fn new(
        beta: f64,
        base_weight: f64,
        ramp_rounds: u32,
        exploit_weight: f64,
        switch_threshold: u32,
    ) -> Result<Self, ScheduleError> {
        for (name, value) in [
            ("beta", beta),
            ("base weight", base_weight),
            ("exploit weight", exploit_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScheduleError::WeightOutOfRange { name, value });
            }
        }
        if beta + base_weight > 1.0 + TOLERANCE {
            return Err(ScheduleError::WeightsExceedUnity {
                beta,
                base: base_weight,
            });
        }
        if exploit_weight > 1.0 - beta + TOLERANCE {
            return Err(ScheduleError::ExploitTooLarge {
                exploit: exploit_weight,
                limit: 1.0 - beta,
            });
        }
        if switch_threshold == 0 {
            return Err(ScheduleError::ZeroSwitchThreshold);
        }

        let schedule = Self {
            beta,
            base_weight,
            ramp_rounds,
            exploit_weight,
            switch_threshold,
        };

        let peak = schedule.ramp_peak();
        if peak > exploit_weight + TOLERANCE {
            return Err(ScheduleError::RampOvershoot {
                peak,
                exploit: exploit_weight,
            });
        }

        Ok(schedule)
    }

    /// Memory weight on the previous posterior.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Gain of the linear ramp.
    pub fn ramp_gain(&self) -> f64 {
        1.0 - self.beta - self.base_weight
    }

    /// Round at which consensus hands over to navigation.
    pub fn switch_threshold(&self) -> u32 {
        self.switch_threshold
    }

    /// Weight on the neighbor mean in round `round`.
    pub fn weight(&self, round: u32) -> f64 {
        if round < self.ramp_rounds {
            let progress = round.min(self.switch_threshold);
            self.base_weight
                + self.ramp_gain() * (f64::from(progress) / f64::from(self.switch_threshold))
        } else {
            self.exploit_weight
        }
    }

    /// Weight on the fresh sensor reading in round `round`.
    pub fn sensed_weight(&self, round: u32) -> f64 {
        1.0 - self.beta - self.weight(round)
    }

    /// Whether `round` is the one that ends consensus.
    pub fn is_switch_round(&self, round: u32) -> bool {
        round == self.switch_threshold
    }

    /// Highest weight the ramp produces before the exploit plateau.
    fn ramp_peak(&self) -> f64 {
        match self.ramp_rounds {
            0 => self.base_weight,
            rounds => self.weight((rounds - 1).min(self.switch_threshold)),
        }
    }
}

impl Default for MixingSchedule {
    fn default() -> Self {
        Self {
            beta: 0.01,
            base_weight: 0.6,
            ramp_rounds: 20,
            exploit_weight: 0.99,
            switch_threshold: 100,
        }
    }
}
