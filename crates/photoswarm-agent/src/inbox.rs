//! Receive-side hand-off between the radio and the control loop.
//!
//! On a host where frames arrive on another thread (or from an interrupt
//! shim), the radio side holds an [`InboxSender`] and the control loop owns
//! the [`Inbox`]. Delivery never blocks: when the channel is full the frame
//! is dropped, which the protocol tolerates since every neighbor keeps
//! re-broadcasting. The control loop drains the inbox into the agent before
//! each step, so the agent itself is only ever touched by one thread.

use photoswarm_wire::Payload;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, warn};

use crate::engine::Agent;
use crate::hal::Distance;

/// Frames buffered between two drains by default.
pub const DEFAULT_INBOX_DEPTH: usize = 32;

/// A frame as handed over by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inbound {
    pub payload: Payload,
    pub distance: Distance,
}

/// Create a connected sender/inbox pair holding up to `depth` frames.
pub fn inbox(depth: usize) -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (InboxSender { tx }, Inbox { rx })
}

/// Radio-side handle.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::Sender<Inbound>,
}

impl InboxSender {
    /// Hand a received frame to the control loop without waiting.
    ///
    /// Returns `false` when the frame was dropped.
    pub fn deliver(&self, payload: Payload, distance: Distance) -> bool {
        match self.tx.try_send(Inbound { payload, distance }) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                warn!(sender = frame.payload[0], "inbox full, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("inbox closed, dropping frame");
                false
            }
        }
    }
}

/// Control-loop side of the channel.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Inbound>,
}

impl Inbox {
    /// Next buffered frame, if any.
    pub fn try_next(&mut self) -> Option<Inbound> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Feed every buffered frame to `agent`; returns how many were fed.
    pub fn drain_into(&mut self, agent: &mut Agent) -> usize {
        let mut fed = 0;
        while let Some(frame) = self.try_next() {
            agent.on_receive(&frame.payload, frame.distance);
            fed += 1;
        }
        fed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use photoswarm_wire::{Message, PeerId, StatusTag};

    #[test]
    fn full_inbox_drops_without_blocking() {
        let (tx, mut rx) = inbox(2);
        let frame = Message::status(PeerId(1), StatusTag::Dispersing)
            .encode()
            .unwrap();

        assert!(tx.deliver(frame, Distance(40)));
        assert!(tx.deliver(frame, Distance(41)));
        assert!(!tx.deliver(frame, Distance(42)));

        assert_eq!(rx.try_next().map(|f| f.distance), Some(Distance(40)));
        assert_eq!(rx.try_next().map(|f| f.distance), Some(Distance(41)));
        assert_eq!(rx.try_next(), None);
    }

    #[test]
    fn delivery_after_inbox_dropped_fails() {
        let (tx, rx) = inbox(4);
        drop(rx);
        assert!(!tx.deliver([0; 6], Distance(10)));
    }

    #[test]
    fn frames_from_another_thread_reach_the_agent() {
        let (tx, mut rx) = inbox(DEFAULT_INBOX_DEPTH);
        let mut agent = Agent::new(PeerId(1), AgentConfig::default()).unwrap();

        let radio = std::thread::spawn(move || {
            for id in 2..7u8 {
                let frame = Message::status(PeerId(id), StatusTag::WaitingForOthers)
                    .encode()
                    .unwrap();
                assert!(tx.deliver(frame, Distance(80)));
            }
        });
        radio.join().unwrap();

        assert_eq!(rx.drain_into(&mut agent), 5);
        assert_eq!(agent.mailbox().len(), 5);
    }
}
