//! Top-level phases and their sub-phases.

use photoswarm_wire::StatusTag;
use serde::{Deserialize, Serialize};

/// Behavioral mode of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Spreading out to the target density.
    #[default]
    Dispersion,
    /// Averaging opinions with neighbors.
    Consensus,
    /// Navigating toward the agreed light level.
    Chemotaxis,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispersion => write!(f, "Dispersion"),
            Self::Consensus => write!(f, "Consensus"),
            Self::Chemotaxis => write!(f, "Chemotaxis"),
        }
    }
}

/// Finer-grained status, broadcast to neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubPhase {
    /// Too close to a neighbor, still searching.
    #[default]
    Dispersing,
    /// Far enough, waiting for the neighborhood.
    WaitingForOthers,
    /// No neighbor heard during the last window.
    Disconnected,
    /// The neighborhood has settled; about to measure.
    ReadyToShare,
    /// Taking the initial light samples.
    Measuring,
    /// Exchanging opinions.
    Sharing,
}

impl SubPhase {
    /// The status tag advertised while in this sub-phase.
    pub const fn status_tag(self) -> StatusTag {
        match self {
            Self::Dispersing => StatusTag::Dispersing,
            Self::WaitingForOthers => StatusTag::WaitingForOthers,
            Self::Disconnected => StatusTag::Disconnected,
            Self::ReadyToShare | Self::Measuring | Self::Sharing => StatusTag::Sharing,
        }
    }
}

impl std::fmt::Display for SubPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispersing => write!(f, "Dispersing"),
            Self::WaitingForOthers => write!(f, "WaitingForOthers"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ReadyToShare => write!(f, "ReadyToShare"),
            Self::Measuring => write!(f, "Measuring"),
            Self::Sharing => write!(f, "Sharing"),
        }
    }
}
