//! Consensus: agree on a light level with the neighborhood.
//!
//! The robot first seeds its opinion from a batch of sensor samples, then
//! runs one DeGroot round per window. The neighbor weight follows the
//! [`MixingSchedule`](photoswarm_consensus::MixingSchedule); when the round
//! counter reaches the switch threshold the agreed value becomes the
//! reference target and the robot starts navigating.

use std::time::Duration;

use tracing::{debug, info};

use super::Agent;
use crate::hal::{Actuator, Clock, Color, Hal, LightSensor};
use crate::phase::{Phase, SubPhase};

/// How long each color of the hand-over cue stays lit.
const CUE_STEP: Duration = Duration::from_millis(100);

impl Agent {
    pub(super) fn consense<H: Hal>(&mut self, hal: &mut H) {
        if self.subphase == SubPhase::Measuring {
            self.measure(hal);
        }

        let now = hal.now();
        if self.subphase == SubPhase::Sharing
            && self.window_elapsed(now, self.config.consensus.window_ticks)
        {
            self.last_window = now;
            self.consensus_round(hal);
        }

        self.arm_opinion();
        hal.set_indicator(Color::opinion_band(
            self.estimator.posterior(),
            self.config.consensus.band_width,
        ));

        if self.schedule.is_switch_round(self.round) {
            self.enter_chemotaxis(hal);
        }
    }

    /// Seed the opinion from a burst of readings and start sharing it.
    fn measure<H: Hal>(&mut self, hal: &mut H) {
        self.round = 0;

        let samples = self.config.consensus.initial_samples;
        let seeded = self
            .estimator
            .seed((0..samples).map(|_| f64::from(hal.ambient_light())));
        self.estimator.set_sensed(seeded);
        info!(robot = %self.id, opinion = seeded, samples, "initial opinion measured");

        hal.pause(self.config.consensus.settle());
        hal.set_indicator(Color::OFF);
        hal.pause(self.config.consensus.blink() * 2);

        self.subphase = SubPhase::Sharing;
        self.last_window = hal.now();
    }

    fn consensus_round<H: Hal>(&mut self, hal: &mut H) {
        self.round += 1;
        let sensed = f64::from(hal.ambient_light());
        let weight = self.schedule.weight(self.round);
        let neighbors = self.mailbox.len();

        let posterior = self.estimator.consensus_round(
            self.mailbox.values().filter_map(|report| report.opinion()),
            sensed,
            weight,
            self.schedule.beta(),
        );
        self.mailbox.clear();

        debug!(
            robot = %self.id,
            round = self.round,
            neighbors,
            weight,
            sensed,
            posterior,
            "consensus round"
        );
    }

    fn enter_chemotaxis<H: Hal>(&mut self, hal: &mut H) {
        self.reference_target = self.estimator.posterior();
        self.phase = Phase::Chemotaxis;
        info!(
            robot = %self.id,
            target = self.reference_target,
            rounds = self.round,
            "consensus reached, navigating toward target"
        );

        for band in 0..8 {
            hal.set_indicator(Color::band(band));
            hal.pause(CUE_STEP);
        }

        self.round += 1;
        self.stuck_counter = 0;
        self.last_light = 0.0;
        self.last_distance_to_target = 0.0;
        self.arrived = false;
        self.last_window = hal.now();
    }
}
