//! Single-slot transmit buffer.
//!
//! The radio asks for a frame at every transmission opportunity and reports
//! when one went out. There is never more than one frame pending: arming a
//! new frame replaces the pending one, so a robot always advertises its
//! latest state and nothing queues up behind a slow channel.

use photoswarm_wire::Payload;

#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: Option<Payload>,
    armed: u64,
    dispatched: u64,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `payload` the frame offered at the next opportunity.
    pub fn arm(&mut self, payload: Payload) {
        self.pending = Some(payload);
        self.armed += 1;
    }

    /// Frame to transmit, if one is pending.
    ///
    /// The frame stays pending until [`acknowledge`](Self::acknowledge).
    pub fn poll(&self) -> Option<Payload> {
        self.pending
    }

    /// The transport dispatched the pending frame.
    pub fn acknowledge(&mut self) {
        if self.pending.take().is_some() {
            self.dispatched += 1;
        }
    }

    /// Whether a frame is waiting for the radio.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Frames armed so far.
    pub fn armed_count(&self) -> u64 {
        self.armed
    }

    /// Frames dispatched so far.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_stays_pending_until_acknowledged() {
        let mut outbox = Outbox::new();
        assert_eq!(outbox.poll(), None);

        outbox.arm([1, 0xAA, 0, 0, 0, 0]);
        assert_eq!(outbox.poll(), Some([1, 0xAA, 0, 0, 0, 0]));
        assert_eq!(outbox.poll(), Some([1, 0xAA, 0, 0, 0, 0]));

        outbox.acknowledge();
        assert_eq!(outbox.poll(), None);
        assert_eq!(outbox.dispatched_count(), 1);
    }

    #[test]
    fn arming_replaces_pending_frame() {
        let mut outbox = Outbox::new();
        outbox.arm([1, 0xAA, 0, 0, 0, 0]);
        outbox.arm([1, 0xAB, 0, 0, 0, 0]);

        assert_eq!(outbox.poll(), Some([1, 0xAB, 0, 0, 0, 0]));
        assert_eq!(outbox.armed_count(), 2);
    }

    #[test]
    fn spurious_acknowledge_is_ignored() {
        let mut outbox = Outbox::new();
        outbox.acknowledge();
        assert_eq!(outbox.dispatched_count(), 0);
        assert!(!outbox.is_pending());
    }
}
