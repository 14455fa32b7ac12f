//! Chemotaxis: climb (or descend) the light field toward the agreed level.
//!
//! The robot has no gradient sensor, so it samples, moves, and compares:
//!
//! ```text
//!   |ambient − target| < arrival ──▶ stop, flash, settle
//!   light changed noticeably?
//!     ├─ yes: closer than before ──▶ keep going forward
//!     │       farther           ──▶ stop, pivot, go forward again
//!     └─ no:  forward, count a flat step
//!   too many flat steps in a row ──▶ escape maneuver
//! ```
//!
//! Neighbors keep sharing opinions while navigating; once per window the
//! posterior drifts toward them and the target follows the posterior.

use std::time::Duration;

use tracing::{debug, info};

use super::Agent;
use crate::config::PivotStrategy;
use crate::hal::{Actuator, Clock, Color, Entropy, Hal, LightSensor, Motion};

/// Indicator flash length.
const FLASH: Duration = Duration::from_millis(100);
/// Short cue after resuming forward motion.
const CUE: Duration = Duration::from_millis(50);

impl Agent {
    pub(super) fn navigate<H: Hal>(&mut self, hal: &mut H) {
        let now = hal.now();
        if self.window_elapsed(now, self.config.chemotaxis.window_ticks) {
            self.last_window = now;
            self.drift_round();
        }
        self.reference_target = self.estimator.posterior();
        self.arm_opinion();

        let ambient = f64::from(hal.ambient_light());
        let distance = (ambient - self.reference_target).abs();
        let change = (self.last_light - ambient).abs();

        if distance < self.config.chemotaxis.arrival_threshold {
            self.hold_position(hal, distance);
            return;
        }
        self.arrived = false;

        if change > self.config.chemotaxis.sensitivity {
            self.follow_gradient(hal, ambient, distance);
        } else {
            self.advance(hal);
            self.stuck_counter += 1;
        }

        if self.stuck_counter > self.config.chemotaxis.stall_threshold {
            self.escape(hal);
        }
    }

    /// Let the posterior follow the neighbors' opinions.
    fn drift_round(&mut self) {
        let neighbors = self.mailbox.len();
        let posterior = self.estimator.drift_round(
            self.mailbox.values().filter_map(|report| report.opinion()),
            self.schedule.beta(),
        );
        self.mailbox.clear();
        debug!(robot = %self.id, neighbors, posterior, "drift round");
    }

    fn hold_position<H: Hal>(&mut self, hal: &mut H, distance: f64) {
        self.set_motion(hal, Motion::Stopped);
        if !self.arrived {
            info!(robot = %self.id, target = self.reference_target, distance, "target light level reached");
        }
        self.arrived = true;

        for _ in 0..2 {
            hal.set_indicator(Color::WHITE);
            hal.pause(FLASH);
            hal.set_indicator(Color::OFF);
            hal.pause(self.config.chemotaxis.step());
        }
        hal.pause(self.config.chemotaxis.arrival_settle());
    }

    /// React to a reading that differs enough from the last one.
    fn follow_gradient<H: Hal>(&mut self, hal: &mut H, ambient: f64, distance: f64) {
        hal.set_indicator(Color::BRIGHT_CYAN);
        hal.pause(FLASH);

        let gradient = distance - self.last_distance_to_target;
        self.last_light = ambient;
        self.last_distance_to_target = distance;
        self.estimator.set_sensed(ambient);
        self.stuck_counter = 0;

        if gradient < 0.0 {
            self.set_motion(hal, Motion::Forward);
            hal.set_indicator(Color::GREEN);
            hal.pause(FLASH);
            hal.set_indicator(Color::OFF);
            hal.pause(self.config.chemotaxis.step());
        } else if gradient > 1.0 {
            self.reorient(hal);
        }
    }

    /// Moving away from the target: turn and try another heading.
    fn reorient<H: Hal>(&mut self, hal: &mut H) {
        self.set_motion(hal, Motion::Stopped);
        hal.set_indicator(Color::WHITE);
        hal.pause(FLASH);

        let side = match self.config.chemotaxis.pivot {
            PivotStrategy::AlwaysRight => Motion::Right,
            PivotStrategy::AlwaysLeft => Motion::Left,
            PivotStrategy::Random if hal.uniform_byte() < 128 => Motion::Right,
            PivotStrategy::Random => Motion::Left,
        };
        self.pivot(hal, side);

        self.set_motion(hal, Motion::Forward);
        hal.set_indicator(Color::VIOLET);
        hal.pause(CUE);
        hal.set_indicator(Color::OFF);
        hal.pause(self.config.chemotaxis.step() * 2);
    }

    /// One forward run without a usable light change.
    fn advance<H: Hal>(&mut self, hal: &mut H) {
        self.set_motion(hal, Motion::Forward);
        hal.set_indicator(Color::YELLOW);
        hal.pause(FLASH);
        hal.set_indicator(Color::OFF);
        hal.pause(self.config.chemotaxis.step());
    }

    /// Break out of a flat or obstructed stretch.
    fn escape<H: Hal>(&mut self, hal: &mut H) {
        debug!(robot = %self.id, flat_steps = self.stuck_counter, "stalled, escaping");
        self.stuck_counter = 0;
        self.stats.escapes += 1;

        self.motion.full_power(hal);
        hal.pause(self.config.chemotaxis.escape_spin());

        let side = if hal.uniform_byte() < self.config.chemotaxis.escape_right_below {
            Motion::Right
        } else {
            Motion::Left
        };
        self.pivot(hal, side);
        self.set_motion(hal, Motion::Forward);
    }

    fn pivot<H: Hal>(&mut self, hal: &mut H, side: Motion) {
        self.set_motion(hal, side);
        hal.set_indicator(if side == Motion::Right {
            Color::BLUE
        } else {
            Color::RED
        });
        hal.pause(FLASH);
        hal.set_indicator(Color::OFF);
        hal.pause(self.config.chemotaxis.pivot_pause());
    }
}
