//! Leaderless Opinion Consensus
//!
//! Robots agree on a light level without a coordinator, a membership list,
//! or any notion of swarm size. Each robot keeps a private opinion and, once
//! per window, blends it with the opinions its neighbors broadcast.
//!
//! # DeGroot Dynamics
//!
//! ```text
//! z_m ← β·z_m + w(k)·z_col + (1 − β − w(k))·z_s
//! ```
//!
//! - `z_col` is the mean of the neighbor reports heard this window
//! - `z_s` is a fresh light reading
//! - `w(k)` ramps up with the round count `k` and then clamps high, so late
//!   rounds are dominated by the neighborhood
//!
//! Repeated local averaging over a connected neighborhood drives every
//! opinion toward a common value.
//!
//! # Per-Round Buffering
//!
//! Neighbor reports arrive asynchronously. The [`NeighborMailbox`] keeps at
//! most one value per peer per window, bounded by an explicit capacity and an
//! [`OverflowPolicy`] for the case where more peers are heard than fit.

mod estimator;
mod mailbox;
mod schedule;

pub use estimator::{streaming_mean, OpinionEstimator};
pub use mailbox::{NeighborMailbox, OverflowPolicy, RecordOutcome, DEFAULT_CAPACITY};
pub use schedule::{MixingSchedule, ScheduleError};
