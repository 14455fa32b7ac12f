//! Broadcast messages exchanged between neighboring robots.

use crate::error::{CodecError, Result};
use crate::fixed::{FixedOpinion, OPINION_WIDTH};
use crate::{Payload, OPINION_OFFSET, PAYLOAD_LEN, SENDER_OFFSET, TAG_OFFSET};

/// Robot identifier as carried in byte 0 of every payload.
///
/// Ids are assumed distinct within radio range; nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId(pub u8);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status a robot advertises to its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusTag {
    /// Still spreading out.
    Dispersing,
    /// Spread out, waiting for the neighborhood to settle.
    WaitingForOthers,
    /// Lost contact with every neighbor. Legacy firmware sends this as its
    /// catch-all status byte.
    Disconnected,
    /// Exchanging opinions; the payload carries a value.
    Sharing,
}

impl StatusTag {
    /// The tag byte on the wire.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Dispersing => 0xAA,
            Self::WaitingForOthers => 0xAB,
            Self::Disconnected => 0xBB,
            Self::Sharing => 0xCA,
        }
    }

    /// Parse a tag byte.
    pub const fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0xAA => Ok(Self::Dispersing),
            0xAB => Ok(Self::WaitingForOthers),
            0xBB => Ok(Self::Disconnected),
            0xCA => Ok(Self::Sharing),
            other => Err(CodecError::UnknownTag(other)),
        }
    }

    /// Whether this tag carries an opinion.
    pub const fn carries_opinion(self) -> bool {
        matches!(self, Self::Sharing)
    }
}

impl std::fmt::Display for StatusTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispersing => write!(f, "Dispersing"),
            Self::WaitingForOthers => write!(f, "WaitingForOthers"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Sharing => write!(f, "Sharing"),
        }
    }
}

/// A decoded broadcast.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Who sent it
    pub sender: PeerId,
    /// Sender's advertised status
    pub tag: StatusTag,
    /// Sender's opinion, present only for [`StatusTag::Sharing`]
    pub opinion: Option<f64>,
}

impl Message {
    /// A status-only message.
    ///
    /// Passing [`StatusTag::Sharing`] here produces a message that fails to
    /// encode; use [`Message::sharing`] instead.
    pub const fn status(sender: PeerId, tag: StatusTag) -> Self {
        Self {
            sender,
            tag,
            opinion: None,
        }
    }

    /// An opinion-sharing message.
    pub const fn sharing(sender: PeerId, opinion: f64) -> Self {
        Self {
            sender,
            tag: StatusTag::Sharing,
            opinion: Some(opinion),
        }
    }

    /// Encode into a six-byte payload.
    ///
    /// Opinion bytes are zeroed for status-only tags.
    pub fn encode(&self) -> Result<Payload> {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[SENDER_OFFSET] = self.sender.0;
        payload[TAG_OFFSET] = self.tag.to_byte();

        if self.tag.carries_opinion() {
            let opinion = self.opinion.ok_or(CodecError::MissingOpinion)?;
            let fixed = FixedOpinion::from_opinion(opinion)?;
            payload[OPINION_OFFSET..].copy_from_slice(&fixed.to_be_bytes());
        }

        Ok(payload)
    }

    /// Decode a received frame.
    ///
    /// Status-only frames may be as short as two bytes; trailing bytes are
    /// ignored unless the tag is [`StatusTag::Sharing`].
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() <= TAG_OFFSET {
            return Err(CodecError::Truncated {
                need: TAG_OFFSET + 1,
                got: frame.len(),
            });
        }

        let sender = PeerId(frame[SENDER_OFFSET]);
        let tag = StatusTag::from_byte(frame[TAG_OFFSET])?;

        if !tag.carries_opinion() {
            return Ok(Self::status(sender, tag));
        }

        let bytes: [u8; OPINION_WIDTH] = frame
            .get(OPINION_OFFSET..OPINION_OFFSET + OPINION_WIDTH)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(CodecError::Truncated {
                need: PAYLOAD_LEN,
                got: frame.len(),
            })?;

        Ok(Self::sharing(sender, FixedOpinion::from_be_bytes(bytes).to_opinion()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tag_bytes_match_legacy_firmware() {
        assert_eq!(StatusTag::Dispersing.to_byte(), 0xAA);
        assert_eq!(StatusTag::WaitingForOthers.to_byte(), 0xAB);
        assert_eq!(StatusTag::Disconnected.to_byte(), 0xBB);
        assert_eq!(StatusTag::Sharing.to_byte(), 0xCA);
    }

    #[test]
    fn unknown_tag_rejected() {
        let frame = [3, 0x42, 0, 0, 0, 0];
        assert_eq!(Message::decode(&frame), Err(CodecError::UnknownTag(0x42)));
    }

    #[test]
    fn status_frame_zeroes_opinion_bytes() {
        let payload = Message::status(PeerId(9), StatusTag::WaitingForOthers)
            .encode()
            .unwrap();
        assert_eq!(payload, [9, 0xAB, 0, 0, 0, 0]);
    }

    #[test]
    fn status_frame_ignores_stale_opinion_bytes() {
        // Legacy firmware leaves the previous opinion in bytes 2..6
        let frame = [4, 0xAA, 0xDE, 0xAD, 0xBE, 0xEF];
        let msg = Message::decode(&frame).unwrap();
        assert_eq!(msg, Message::status(PeerId(4), StatusTag::Dispersing));
    }

    #[test]
    fn short_status_frame_accepted() {
        let msg = Message::decode(&[1, 0xAB]).unwrap();
        assert_eq!(msg.tag, StatusTag::WaitingForOthers);
    }

    #[test]
    fn truncated_frames_rejected() {
        assert_eq!(
            Message::decode(&[1]),
            Err(CodecError::Truncated { need: 2, got: 1 })
        );
        assert_eq!(
            Message::decode(&[1, 0xCA, 0, 0]),
            Err(CodecError::Truncated { need: 6, got: 4 })
        );
    }

    #[test]
    fn sharing_without_opinion_fails_to_encode() {
        let msg = Message::status(PeerId(1), StatusTag::Sharing);
        assert_eq!(msg.encode(), Err(CodecError::MissingOpinion));
    }

    #[test]
    fn sharing_encodes_big_endian() {
        let payload = Message::sharing(PeerId(2), 700.5).encode().unwrap();
        // 700500 = 0x000AB054
        assert_eq!(payload, [2, 0xCA, 0x00, 0x0A, 0xB0, 0x54]);
    }

    proptest! {
        #[test]
        fn sharing_survives_wire_within_quantum(id in any::<u8>(), opinion in 0.0f64..65_536.0) {
            let payload = Message::sharing(PeerId(id), opinion).encode().unwrap();
            let decoded = Message::decode(&payload).unwrap();

            prop_assert_eq!(decoded.sender, PeerId(id));
            prop_assert_eq!(decoded.tag, StatusTag::Sharing);
            let value = decoded.opinion.unwrap();
            prop_assert!((opinion - value).abs() < 1.0 / crate::OPINION_SCALE);
        }
    }
}
