//! Local opinion state and the update rules applied once per window.
//!
//! Three scalars describe a robot's belief:
//!
//! - `posterior` (z_m): the current best opinion, the value that is shared
//! - `sensed` (z_s): the latest raw light reading
//! - `neighbor_consensus` (z_col): mean of the opinions heard this round
//!
//! During consensus the posterior blends all three. During chemotaxis the
//! sensor term is dropped and the posterior only drifts toward its
//! neighbors.

/// Incremental arithmetic mean.
///
/// Computes `z += (v - z) / t` for `t = 1, 2, ...` without storing the
/// samples. Returns `None` for an empty input.
pub fn streaming_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut mean = 0.0;
    let mut count = 0u32;
    for value in values {
        count += 1;
        mean += (value - mean) / f64::from(count);
    }
    (count > 0).then_some(mean)
}

/// A robot's opinion state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpinionEstimator {
    posterior: f64,
    sensed: f64,
    neighbor_consensus: f64,
}

impl OpinionEstimator {
    /// Create an estimator with every term at zero.
    pub const fn new() -> Self {
        Self {
            posterior: 0.0,
            sensed: 0.0,
            neighbor_consensus: 0.0,
        }
    }

    /// Current opinion.
    pub fn posterior(&self) -> f64 {
        self.posterior
    }

    /// Latest sensor reading fed into the estimator.
    pub fn sensed(&self) -> f64 {
        self.sensed
    }

    /// Neighbor mean computed in the last round.
    pub fn neighbor_consensus(&self) -> f64 {
        self.neighbor_consensus
    }

    /// Record a sensor reading without running an update.
    pub fn set_sensed(&mut self, sensed: f64) {
        self.sensed = sensed;
    }

    /// Initialize the posterior from a batch of sensor samples.
    ///
    /// An empty batch leaves the posterior unchanged.
    pub fn seed<I>(&mut self, samples: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        if let Some(mean) = streaming_mean(samples) {
            self.posterior = mean;
        }
        self.posterior
    }

    /// One DeGroot consensus round.
    ///
    /// `posterior = beta·posterior + weight·neighbors + (1 − beta − weight)·sensed`,
    /// where `neighbors` falls back to `sensed` when nobody reported.
    pub fn consensus_round<I>(&mut self, neighbors: I, sensed: f64, weight: f64, beta: f64) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        self.sensed = sensed;
        self.neighbor_consensus = streaming_mean(neighbors).unwrap_or(sensed);
        self.posterior = beta * self.posterior
            + weight * self.neighbor_consensus
            + (1.0 - beta - weight) * self.sensed;
        self.posterior
    }

    /// One drift-compensation round, used once the robot is navigating.
    ///
    /// `posterior = beta·posterior + (1 − beta)·neighbors`, where `neighbors`
    /// falls back to the posterior itself when nobody reported.
    pub fn drift_round<I>(&mut self, neighbors: I, beta: f64) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        self.neighbor_consensus = streaming_mean(neighbors).unwrap_or(self.posterior);
        self.posterior = beta * self.posterior + (1.0 - beta) * self.neighbor_consensus;
        self.posterior
    }
}
