//! Fixed-point opinion encoding.
//!
//! Opinions travel as `trunc(opinion × OPINION_SCALE)` in an unsigned
//! big-endian integer of `OPINION_WIDTH` bytes. Truncation means a decoded
//! value is never above the original and never more than `1 / OPINION_SCALE`
//! below it.

use crate::error::{CodecError, Result};

/// Multiplier applied to an opinion before truncation.
pub const OPINION_SCALE: f64 = 1000.0;

/// Width of the encoded opinion in bytes.
pub const OPINION_WIDTH: usize = 4;

/// An opinion in its on-wire fixed-point form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedOpinion(pub u32);

impl FixedOpinion {
    /// Largest opinion that survives encoding.
    pub const MAX_OPINION: f64 = u32::MAX as f64 / OPINION_SCALE;

    /// Quantize an opinion.
    ///
    /// Fails for NaN, infinities, negative values and values above
    /// [`Self::MAX_OPINION`].
    pub fn from_opinion(opinion: f64) -> Result<Self> {
        if !opinion.is_finite() || opinion < 0.0 || opinion > Self::MAX_OPINION {
            return Err(CodecError::OpinionOutOfRange(opinion));
        }
        Ok(Self((opinion * OPINION_SCALE) as u32))
    }

    /// Quantize an opinion, clamping it into the representable range.
    pub fn saturating_from(opinion: f64) -> Self {
        if opinion.is_nan() {
            return Self(0);
        }
        Self((opinion.clamp(0.0, Self::MAX_OPINION) * OPINION_SCALE) as u32)
    }

    /// Back to a floating-point opinion.
    pub fn to_opinion(self) -> f64 {
        f64::from(self.0) / OPINION_SCALE
    }

    /// Big-endian bytes as they appear on the wire.
    pub const fn to_be_bytes(self) -> [u8; OPINION_WIDTH] {
        self.0.to_be_bytes()
    }

    /// Read from big-endian wire bytes.
    pub const fn from_be_bytes(bytes: [u8; OPINION_WIDTH]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}
