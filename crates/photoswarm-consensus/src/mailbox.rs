//! Per-round neighbor reports.
//!
//! The mailbox holds at most one entry per peer. A repeated report from the
//! same peer overwrites its value in place, so arrival order is the order in
//! which each peer was *first* heard this round. The owner clears the
//! mailbox once per window rollover.
//!
//! Capacity is fixed at construction. What happens when a new peer shows up
//! in a full mailbox is decided by the [`OverflowPolicy`].

use photoswarm_wire::PeerId;

/// Legacy firmware sized its neighbor arrays for 21 entries.
pub const DEFAULT_CAPACITY: usize = 21;

/// What to do with a report from a new peer when the mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverflowPolicy {
    /// Drop the peer heard first this round and append the newcomer.
    #[default]
    EvictOldest,
    /// Keep the current entries and discard the newcomer.
    DropNewest,
}

/// Result of recording a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new peer was appended.
    Inserted,
    /// A known peer's value was overwritten.
    Updated,
    /// The mailbox was full; the given peer was evicted to make room.
    Evicted(PeerId),
    /// The mailbox was full; the report was discarded.
    Dropped,
}

impl RecordOutcome {
    /// Whether the report hit the capacity limit.
    pub const fn overflowed(&self) -> bool {
        matches!(self, Self::Evicted(_) | Self::Dropped)
    }
}

/// Bounded, peer-keyed buffer of reports collected during one window.
#[derive(Debug, Clone)]
pub struct NeighborMailbox<T> {
    entries: Vec<(PeerId, T)>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T> NeighborMailbox<T> {
    /// Create an empty mailbox.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    /// Record a report from `peer`.
    pub fn record(&mut self, peer: PeerId, value: T) -> RecordOutcome {
        if let Some(slot) = self.entries.iter_mut().find(|(id, _)| *id == peer) {
            slot.1 = value;
            return RecordOutcome::Updated;
        }

        if self.entries.len() < self.capacity {
            self.entries.push((peer, value));
            return RecordOutcome::Inserted;
        }

        match self.policy {
            OverflowPolicy::EvictOldest => {
                let (evicted, _) = self.entries.remove(0);
                self.entries.push((peer, value));
                RecordOutcome::Evicted(evicted)
            }
            OverflowPolicy::DropNewest => RecordOutcome::Dropped,
        }
    }

    /// Value most recently reported by `peer` this round.
    pub fn get(&self, peer: PeerId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(id, _)| *id == peer)
            .map(|(_, value)| value)
    }

    /// Whether `peer` has reported this round.
    pub fn contains(&self, peer: PeerId) -> bool {
        self.get(peer).is_some()
    }

    /// Entries in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (PeerId, &T)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Values in arrival order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Number of distinct peers heard this round.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peer has reported this round.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of distinct peers per round.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Start a new round.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for NeighborMailbox<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, OverflowPolicy::default())
    }
}
