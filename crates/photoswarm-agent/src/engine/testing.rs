//! Scripted hardware for engine tests.

use std::collections::VecDeque;
use std::time::Duration;

use crate::hal::{Actuator, Clock, Color, Entropy, LightSensor, Motion, Tick};

/// A robot whose sensor readings and random bytes come from scripts.
///
/// When a script runs out, the sensor repeats `light` and the random
/// source returns `byte`. Pauses advance the clock.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHal {
    pub now: Tick,
    pub light: u16,
    pub light_script: VecDeque<u16>,
    pub byte: u8,
    pub byte_script: VecDeque<u8>,
    pub applied: Vec<Motion>,
    pub colors: Vec<Color>,
    pub bursts: usize,
    pub paused_ms: u128,
    pub samples_taken: usize,
}

impl ScriptedHal {
    pub fn new(light: u16) -> Self {
        Self {
            light,
            ..Default::default()
        }
    }

    /// Move the clock forward without pausing.
    pub fn advance(&mut self, ticks: u32) {
        self.now = Tick(self.now.0.wrapping_add(ticks));
    }

    pub fn script_light(&mut self, readings: impl IntoIterator<Item = u16>) {
        self.light_script.extend(readings);
    }

    pub fn script_bytes(&mut self, bytes: impl IntoIterator<Item = u8>) {
        self.byte_script.extend(bytes);
    }

    pub fn last_motion(&self) -> Option<Motion> {
        self.applied.last().copied()
    }
}

impl Actuator for ScriptedHal {
    fn apply_motion(&mut self, motion: Motion) {
        self.applied.push(motion);
    }

    fn full_power(&mut self) {
        self.bursts += 1;
    }

    fn set_indicator(&mut self, color: Color) {
        self.colors.push(color);
    }
}

impl LightSensor for ScriptedHal {
    fn ambient_light(&mut self) -> u16 {
        self.samples_taken += 1;
        self.light_script.pop_front().unwrap_or(self.light)
    }
}

impl Clock for ScriptedHal {
    fn now(&self) -> Tick {
        self.now
    }

    fn pause(&mut self, duration: Duration) {
        self.paused_ms += duration.as_millis();
        self.advance(Tick::from_duration(duration));
    }
}

impl Entropy for ScriptedHal {
    fn uniform_byte(&mut self) -> u8 {
        self.byte_script.pop_front().unwrap_or(self.byte)
    }
}
