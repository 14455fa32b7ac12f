//! Error types for photoswarm-wire.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The frame is shorter than the fields its tag requires.
    #[error("truncated frame: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    /// Byte 1 does not name a known status.
    #[error("unknown status tag 0x{0:02X}")]
    UnknownTag(u8),

    /// The opinion cannot be represented in the fixed-point field.
    #[error("opinion {0} does not fit the fixed-point field")]
    OpinionOutOfRange(f64),

    /// A sharing message was built without an opinion.
    #[error("sharing message carries no opinion")]
    MissingOpinion,
}
