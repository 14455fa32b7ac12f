//! Hardware seams.
//!
//! The controller never touches motors, LEDs, the light sensor, the clock
//! or the random source directly. A host provides them through these traits;
//! anything implementing all four is a [`Hal`].
//!
//! The radio is not behind a trait: the host pulls outgoing frames from the
//! agent's [`Outbox`](crate::Outbox) and pushes received frames into
//! [`Agent::on_receive`](crate::Agent::on_receive), directly or through an
//! [`Inbox`](crate::Inbox).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kilobot clock rate.
pub const TICKS_PER_SECOND: u32 = 32;

/// A reading of the robot's free-running tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tick(pub u32);

impl Tick {
    /// Ticks elapsed since `earlier`, tolerant of counter wrap-around.
    pub const fn since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Tick count covering `duration`, rounded down.
    pub fn from_duration(duration: Duration) -> u32 {
        (duration.as_millis() * u128::from(TICKS_PER_SECOND) / 1000) as u32
    }
}

/// Peer distance estimated by the radio from signal strength, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Distance(pub u16);

impl Distance {
    pub const fn millimeters(self) -> u16 {
        self.0
    }
}

/// Discrete drive commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Motion {
    /// Both motors off.
    #[default]
    Stopped,
    /// Both motors at the calibrated straight speed.
    Forward,
    /// Pivot on the left motor.
    Left,
    /// Pivot on the right motor.
    Right,
}

impl std::fmt::Display for Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Forward => write!(f, "Forward"),
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
        }
    }
}

/// Status LED color, two bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const OFF: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(1, 1, 1);
    pub const RED: Self = Self::rgb(1, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 1, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 1);
    pub const CYAN: Self = Self::rgb(0, 1, 1);
    pub const YELLOW: Self = Self::rgb(1, 1, 0);
    pub const BRIGHT_CYAN: Self = Self::rgb(0, 3, 3);
    pub const VIOLET: Self = Self::rgb(3, 0, 3);

    /// Build a color; each channel is masked to two bits.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r & 0b11,
            g: g & 0b11,
            b: b & 0b11,
        }
    }

    /// One of the eight opinion band colors.
    ///
    /// Bit 2 drives red, bit 1 drives green (at level 2) and bit 0 drives
    /// blue, as the legacy firmware does.
    pub const fn band(band: u8) -> Self {
        let band = band % 8;
        Self::rgb(band >> 2, band & 0b010, band & 0b001)
    }

    /// Band color for an opinion: `(trunc(opinion) / width) mod 8`.
    pub fn opinion_band(opinion: f64, width: u32) -> Self {
        let width = i64::from(width.max(1));
        let band = (opinion as i64 / width).rem_euclid(8);
        Self::band(band as u8)
    }
}

/// Motors and status LED.
pub trait Actuator {
    /// Drive the motors. Called only when the command changes.
    fn apply_motion(&mut self, motion: Motion);

    /// Both motors at full power, used to break free of an obstruction.
    fn full_power(&mut self);

    /// Set the status LED.
    fn set_indicator(&mut self, color: Color);
}

/// Ambient light sensor.
pub trait LightSensor {
    /// A debounced, averaged light reading.
    fn ambient_light(&mut self) -> u16;
}

/// Time source.
pub trait Clock {
    /// Current tick counter.
    fn now(&self) -> Tick;

    /// Block for `duration`. Motors keep executing the current command.
    fn pause(&mut self, duration: Duration);
}

/// Pseudo-random source.
pub trait Entropy {
    /// Uniform byte in `0..=255`.
    fn uniform_byte(&mut self) -> u8;
}

/// Everything the controller needs from the robot.
pub trait Hal: Actuator + LightSensor + Clock + Entropy {}

impl<T: Actuator + LightSensor + Clock + Entropy> Hal for T {}

/// Idempotent wrapper around [`Actuator::apply_motion`].
///
/// Re-issuing the current command does not touch the motors. A
/// [`full_power`](Self::full_power) burst bypasses the tracked command, so
/// the next command is always applied afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionController {
    current: Motion,
    overridden: bool,
}

impl MotionController {
    /// Last commanded motion.
    pub fn current(&self) -> Motion {
        self.current
    }

    /// Command `motion`; returns whether the motors were touched.
    pub fn set<A: Actuator + ?Sized>(&mut self, actuator: &mut A, motion: Motion) -> bool {
        if self.current == motion && !self.overridden {
            return false;
        }
        self.current = motion;
        self.overridden = false;
        actuator.apply_motion(motion);
        true
    }

    /// Full-power burst outside the command tracking.
    pub fn full_power<A: Actuator + ?Sized>(&mut self, actuator: &mut A) {
        self.overridden = true;
        actuator.full_power();
    }
}
