//! Ambient light in the arena and the sensor that reads it.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Highest value the light sensor reports.
pub const MAX_READING: f64 = 1023.0;

/// Light level as a function of position, in sensor units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightField {
    /// Same level everywhere.
    Uniform { level: f64 },
    /// Changes along the x axis.
    Linear { base: f64, slope_per_mm: f64 },
    /// Brightest at `center`, fading linearly with distance.
    Radial {
        center: [f64; 2],
        peak: f64,
        slope_per_mm: f64,
    },
}

impl Default for LightField {
    fn default() -> Self {
        Self::Radial {
            center: [500.0, 500.0],
            peak: 900.0,
            slope_per_mm: 1.0,
        }
    }
}

impl LightField {
    /// Noise-free level at `(x, y)`, clamped to the sensor range.
    pub fn level_at(&self, x: f64, y: f64) -> f64 {
        let level = match *self {
            Self::Uniform { level } => level,
            Self::Linear { base, slope_per_mm } => base + slope_per_mm * x,
            Self::Radial {
                center,
                peak,
                slope_per_mm,
            } => peak - slope_per_mm * (x - center[0]).hypot(y - center[1]),
        };
        level.clamp(0.0, MAX_READING)
    }
}

/// Noisy sensor averaged over a burst of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModel {
    /// Half-width of the uniform noise on a single sample
    pub noise: f64,
    /// Samples averaged per reading
    pub samples: u32,
}

impl Default for SensorModel {
    fn default() -> Self {
        Self {
            noise: 8.0,
            samples: 16,
        }
    }
}

impl SensorModel {
    /// One averaged reading of `field` at `(x, y)`.
    pub fn read<R: Rng + ?Sized>(&self, field: &LightField, x: f64, y: f64, rng: &mut R) -> u16 {
        let level = field.level_at(x, y);
        let samples = self.samples.max(1);
        let noise = self.noise.abs();

        let sum: f64 = (0..samples)
            .map(|_| (level + rng.gen_range(-noise..=noise)).clamp(0.0, MAX_READING))
            .sum();
        (sum / f64::from(samples)).round() as u16
    }
}
