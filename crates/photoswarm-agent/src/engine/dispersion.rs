//! Dispersion: spread out using only "too close / far enough" feedback.
//!
//! Once per window the robot looks at what it heard:
//!
//! - nothing → stop and flag itself disconnected; moving blind could only
//!   make the separation worse
//! - the last sender is far enough → stop and wait; if no neighbor still
//!   reports dispersing, the neighborhood is settled and consensus begins
//! - the last sender is too close → one random search step

use tracing::{debug, info};

use super::Agent;
use crate::hal::{Actuator, Clock, Color, Entropy, Hal, Motion};
use crate::phase::{Phase, SubPhase};

impl Agent {
    pub(super) fn disperse<H: Hal>(&mut self, hal: &mut H) {
        let now = hal.now();
        if self.window_elapsed(now, self.config.dispersion.window_ticks) {
            self.last_window = now;
            self.close_dispersion_window(hal);
        }

        if let Some(color) = dispersion_color(self.subphase) {
            hal.set_indicator(color);
        }
    }

    fn close_dispersion_window<H: Hal>(&mut self, hal: &mut H) {
        if std::mem::take(&mut self.heard) {
            self.subphase = SubPhase::Dispersing;
            let distance = self.last_peer_distance.unwrap_or_default();

            if distance.millimeters() > self.config.dispersion.separation_threshold {
                self.set_motion(hal, Motion::Stopped);
                self.subphase = SubPhase::WaitingForOthers;

                if self.mailbox.values().all(|report| !report.is_dispersing()) {
                    self.subphase = SubPhase::ReadyToShare;
                }
            } else {
                self.random_search(hal);
            }

            debug!(
                robot = %self.id,
                distance = distance.millimeters(),
                neighbors = self.mailbox.len(),
                subphase = %self.subphase,
                "dispersion window closed"
            );

            if self.subphase == SubPhase::ReadyToShare {
                self.set_motion(hal, Motion::Stopped);
                self.enter_consensus();
            }
        } else {
            if self.subphase != SubPhase::Disconnected {
                info!(robot = %self.id, "no neighbor heard this window, halting");
            }
            self.set_motion(hal, Motion::Stopped);
            self.subphase = SubPhase::Disconnected;
        }

        self.mailbox.clear();
    }

    /// Forward with probability 1/2, left or right with 1/4 each.
    fn random_search<H: Hal>(&mut self, hal: &mut H) {
        let motion = match hal.uniform_byte() % 4 {
            0 | 1 => Motion::Forward,
            2 => Motion::Left,
            _ => Motion::Right,
        };
        self.set_motion(hal, motion);
    }

    fn enter_consensus(&mut self) {
        info!(robot = %self.id, "neighborhood settled, entering consensus");
        self.phase = Phase::Consensus;
        self.subphase = SubPhase::Measuring;
        self.round = 0;
    }
}

fn dispersion_color(subphase: SubPhase) -> Option<Color> {
    match subphase {
        SubPhase::Dispersing => Some(Color::GREEN),
        SubPhase::Disconnected => Some(Color::RED),
        SubPhase::WaitingForOthers => Some(Color::BLUE),
        SubPhase::ReadyToShare => Some(Color::CYAN),
        SubPhase::Measuring | SubPhase::Sharing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::ScriptedHal;
    use super::*;
    use crate::config::AgentConfig;
    use crate::hal::Distance;
    use photoswarm_wire::{Message, PeerId, StatusTag};

    const WINDOW: u32 = 33;

    fn status(id: u8, tag: StatusTag) -> [u8; 6] {
        Message::status(PeerId(id), tag).encode().unwrap()
    }

    fn agent() -> Agent {
        Agent::new(PeerId(1), AgentConfig::default()).unwrap()
    }

    #[test]
    fn nothing_happens_before_window_elapses() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        hal.advance(32);
        agent.step(&mut hal);

        assert_eq!(agent.subphase(), SubPhase::Dispersing);
        assert_eq!(hal.colors.last(), Some(&Color::GREEN));
    }

    #[test]
    fn three_silent_windows_end_disconnected_and_stopped() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        // Get the robot moving first
        agent.on_receive(&status(2, StatusTag::Dispersing), Distance(20));
        hal.advance(WINDOW);
        agent.step(&mut hal);
        assert_eq!(agent.motion(), Motion::Forward);

        for _ in 0..3 {
            hal.advance(WINDOW);
            agent.step(&mut hal);
        }

        assert_eq!(agent.subphase(), SubPhase::Disconnected);
        assert_eq!(agent.motion(), Motion::Stopped);
        assert_eq!(hal.last_motion(), Some(Motion::Stopped));
        assert_eq!(hal.colors.last(), Some(&Color::RED));
    }

    #[test]
    fn disconnected_robot_recovers_on_next_frame() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        hal.advance(WINDOW);
        agent.step(&mut hal);
        assert_eq!(agent.subphase(), SubPhase::Disconnected);

        agent.on_receive(&status(2, StatusTag::Dispersing), Distance(90));
        hal.advance(WINDOW);
        agent.step(&mut hal);
        assert_eq!(agent.subphase(), SubPhase::WaitingForOthers);
    }

    #[test]
    fn far_settled_neighbors_start_consensus_within_one_window() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        agent.on_receive(&status(2, StatusTag::WaitingForOthers), Distance(80));
        agent.on_receive(&status(3, StatusTag::WaitingForOthers), Distance(80));
        hal.advance(WINDOW);
        agent.step(&mut hal);

        assert_eq!(agent.phase(), Phase::Consensus);
        assert_eq!(agent.subphase(), SubPhase::Measuring);
        assert_eq!(agent.motion(), Motion::Stopped);
        assert!(agent.mailbox().is_empty());
    }

    #[test]
    fn dispersing_neighbor_keeps_robot_waiting() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        agent.on_receive(&status(2, StatusTag::WaitingForOthers), Distance(80));
        agent.on_receive(&status(3, StatusTag::Dispersing), Distance(80));
        hal.advance(WINDOW);
        agent.step(&mut hal);

        assert_eq!(agent.phase(), Phase::Dispersion);
        assert_eq!(agent.subphase(), SubPhase::WaitingForOthers);
        assert_eq!(hal.colors.last(), Some(&Color::BLUE));
        assert!(agent.mailbox().is_empty(), "mailbox clears every window");
    }

    #[test]
    fn threshold_distance_counts_as_too_close() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);
        hal.byte = 2;

        agent.on_receive(&status(2, StatusTag::WaitingForOthers), Distance(60));
        hal.advance(WINDOW);
        agent.step(&mut hal);

        assert_eq!(agent.subphase(), SubPhase::Dispersing);
        assert_eq!(agent.motion(), Motion::Left);
    }

    #[test]
    fn random_search_maps_draws_to_moves() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);
        hal.script_bytes([4, 9, 6, 7]);

        let mut moves = Vec::new();
        for _ in 0..4 {
            agent.on_receive(&status(2, StatusTag::Dispersing), Distance(10));
            hal.advance(WINDOW);
            agent.step(&mut hal);
            moves.push(agent.motion());
        }

        assert_eq!(
            moves,
            vec![Motion::Forward, Motion::Forward, Motion::Left, Motion::Right]
        );
        // The second Forward was not re-applied to the motors
        assert_eq!(
            hal.applied,
            vec![Motion::Forward, Motion::Left, Motion::Right]
        );
    }

    #[test]
    fn last_frame_distance_decides() {
        let mut agent = agent();
        let mut hal = ScriptedHal::new(500);

        agent.on_receive(&status(2, StatusTag::WaitingForOthers), Distance(20));
        agent.on_receive(&status(3, StatusTag::WaitingForOthers), Distance(95));
        hal.advance(WINDOW);
        agent.step(&mut hal);

        assert_eq!(agent.phase(), Phase::Consensus);
    }
}
