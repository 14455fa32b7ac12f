//! Photoswarm Wire Format
//!
//! Every robot broadcasts a fixed six-byte payload. The transport computes
//! and checks the CRC; this crate only deals with the payload bytes.
//!
//! # Layout
//!
//! ```text
//! byte 0      sender id
//! byte 1      status tag   (0xAA dispersing, 0xAB waiting, 0xBB disconnected, 0xCA sharing)
//! bytes 2..6  opinion × 1000 as big-endian u32, only meaningful for 0xCA
//! ```
//!
//! The fixed-point encoding is the legacy Kilobot format, so peers running
//! older firmware can still take part in the exchange.

mod error;
mod fixed;
mod message;

pub use error::{CodecError, Result};
pub use fixed::{FixedOpinion, OPINION_SCALE, OPINION_WIDTH};
pub use message::{Message, PeerId, StatusTag};

/// Size of a broadcast payload in bytes.
pub const PAYLOAD_LEN: usize = 6;

/// Offset of the sender id within the payload.
pub const SENDER_OFFSET: usize = 0;

/// Offset of the status tag within the payload.
pub const TAG_OFFSET: usize = 1;

/// Offset of the fixed-point opinion within the payload.
pub const OPINION_OFFSET: usize = 2;

/// A raw broadcast payload.
pub type Payload = [u8; PAYLOAD_LEN];

// The opinion must fit behind the header bytes.
const _: () = assert!(OPINION_OFFSET + OPINION_WIDTH == PAYLOAD_LEN);
