//! Simulated robot body.
//!
//! A [`SimRobot`] is the hardware an [`Agent`](photoswarm_agent::Agent)
//! drives in the arena. Motion is only integrated while the controller
//! pauses, which is exactly when a real robot's motors run unattended.

use std::f64::consts::TAU;
use std::time::Duration;

use photoswarm_agent::{Actuator, Clock, Color, Entropy, LightSensor, Motion, Tick, TICKS_PER_SECOND};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::field::{LightField, SensorModel};

/// Half the body diameter; keeps robots off the walls.
pub const BODY_RADIUS_MM: f64 = 16.5;

/// Drive speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kinematics {
    /// Straight-line speed
    pub forward_mm_s: f64,
    /// Pivot rate
    pub turn_deg_s: f64,
    /// Straight-line speed during a full-power burst
    pub burst_mm_s: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            forward_mm_s: 10.0,
            turn_deg_s: 45.0,
            burst_mm_s: 20.0,
        }
    }
}

/// The square world robots live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    /// Side length; the arena spans `[0, size_mm]` on both axes
    pub size_mm: f64,
    pub field: LightField,
    pub sensor: SensorModel,
    pub kinematics: Kinematics,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            size_mm: 1000.0,
            field: LightField::default(),
            sensor: SensorModel::default(),
            kinematics: Kinematics::default(),
        }
    }
}

impl Arena {
    pub fn center(&self) -> [f64; 2] {
        [self.size_mm / 2.0, self.size_mm / 2.0]
    }

    /// Clamp a coordinate so the body stays inside the walls.
    fn clamp(&self, value: f64) -> f64 {
        value.clamp(BODY_RADIUS_MM, self.size_mm - BODY_RADIUS_MM)
    }
}

/// Position and heading (radians, counter-clockwise from +x).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drive {
    Command(Motion),
    Burst,
}

/// One robot in the arena.
#[derive(Debug, Clone)]
pub struct SimRobot {
    pose: Pose,
    drive: Drive,
    led: Color,
    /// Simulation time this robot has reached
    elapsed_ms: u64,
    /// Power-up value of the tick counter
    clock_offset: u32,
    odometer_mm: f64,
    arena: Arena,
    rng: StdRng,
}

impl SimRobot {
    /// Place a robot; its clock starts at `start_ms` with the tick counter
    /// reading `clock_offset`.
    pub fn new(pose: Pose, start_ms: u64, clock_offset: u32, arena: Arena, rng: StdRng) -> Self {
        let pose = Pose {
            x: arena.clamp(pose.x),
            y: arena.clamp(pose.y),
            heading: pose.heading.rem_euclid(TAU),
        };
        Self {
            pose,
            drive: Drive::Command(Motion::Stopped),
            led: Color::OFF,
            elapsed_ms: start_ms,
            clock_offset,
            odometer_mm: 0.0,
            arena,
            rng,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn led(&self) -> Color {
        self.led
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Total distance driven.
    pub fn odometer_mm(&self) -> f64 {
        self.odometer_mm
    }

    /// Noise-free light level under the robot.
    pub fn light_level(&self) -> f64 {
        self.arena.field.level_at(self.pose.x, self.pose.y)
    }

    fn integrate(&mut self, seconds: f64) {
        let kinematics = self.arena.kinematics;
        let turn = kinematics.turn_deg_s.to_radians() * seconds;
        match self.drive {
            Drive::Command(Motion::Stopped) => {}
            Drive::Command(Motion::Forward) => self.translate(kinematics.forward_mm_s * seconds),
            Drive::Command(Motion::Left) => self.rotate(turn),
            Drive::Command(Motion::Right) => self.rotate(-turn),
            Drive::Burst => self.translate(kinematics.burst_mm_s * seconds),
        }
    }

    fn translate(&mut self, distance: f64) {
        let x = self.arena.clamp(self.pose.x + distance * self.pose.heading.cos());
        let y = self.arena.clamp(self.pose.y + distance * self.pose.heading.sin());
        self.odometer_mm += (x - self.pose.x).hypot(y - self.pose.y);
        self.pose.x = x;
        self.pose.y = y;
    }

    fn rotate(&mut self, angle: f64) {
        self.pose.heading = (self.pose.heading + angle).rem_euclid(TAU);
    }
}

impl Actuator for SimRobot {
    fn apply_motion(&mut self, motion: Motion) {
        self.drive = Drive::Command(motion);
    }

    fn full_power(&mut self) {
        self.drive = Drive::Burst;
    }

    fn set_indicator(&mut self, color: Color) {
        self.led = color;
    }
}

impl LightSensor for SimRobot {
    fn ambient_light(&mut self) -> u16 {
        let Pose { x, y, .. } = self.pose;
        self.arena.sensor.read(&self.arena.field, x, y, &mut self.rng)
    }
}

impl Clock for SimRobot {
    fn now(&self) -> Tick {
        let ticks = self.elapsed_ms * u64::from(TICKS_PER_SECOND) / 1000;
        Tick(self.clock_offset.wrapping_add(ticks as u32))
    }

    fn pause(&mut self, duration: Duration) {
        self.elapsed_ms += duration.as_millis() as u64;
        self.integrate(duration.as_secs_f64());
    }
}

impl Entropy for SimRobot {
    fn uniform_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn robot_at(x: f64, y: f64, heading: f64) -> SimRobot {
        SimRobot::new(
            Pose { x, y, heading },
            0,
            0,
            Arena::default(),
            StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn forward_moves_along_heading() {
        let mut robot = robot_at(500.0, 500.0, 0.0);
        robot.apply_motion(Motion::Forward);
        robot.pause(Duration::from_secs(2));

        assert!((robot.pose().x - 520.0).abs() < 1e-9);
        assert!((robot.pose().y - 500.0).abs() < 1e-9);
        assert!((robot.odometer_mm() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn pivots_turn_in_place() {
        let mut robot = robot_at(500.0, 500.0, 0.0);
        robot.apply_motion(Motion::Left);
        robot.pause(Duration::from_secs(2));
        assert!((robot.pose().heading - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        robot.apply_motion(Motion::Right);
        robot.pause(Duration::from_secs(4));
        assert!((robot.pose().heading - 3.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(robot.odometer_mm(), 0.0);
    }

    #[test]
    fn walls_stop_the_robot() {
        let mut robot = robot_at(990.0, 500.0, 0.0);
        assert_eq!(robot.pose().x, 1000.0 - BODY_RADIUS_MM);

        robot.apply_motion(Motion::Forward);
        robot.pause(Duration::from_secs(10));
        assert_eq!(robot.pose().x, 1000.0 - BODY_RADIUS_MM);
    }

    #[test]
    fn burst_runs_until_next_command() {
        let mut robot = robot_at(500.0, 500.0, 0.0);
        robot.full_power();
        robot.pause(Duration::from_secs(1));
        assert!((robot.pose().x - 520.0).abs() < 1e-9);

        robot.apply_motion(Motion::Stopped);
        robot.pause(Duration::from_secs(1));
        assert!((robot.pose().x - 520.0).abs() < 1e-9);
    }

    #[test]
    fn clock_counts_ticks_from_offset() {
        let mut robot = SimRobot::new(
            Pose::default(),
            500,
            u32::MAX - 10,
            Arena::default(),
            StdRng::seed_from_u64(0),
        );
        let start = robot.now();
        robot.pause(Duration::from_secs(1));

        assert_eq!(robot.now().since(start), TICKS_PER_SECOND);
        assert_eq!(robot.elapsed_ms(), 1500);
    }

    #[test]
    fn sensor_reads_field_under_robot() {
        let arena = Arena {
            field: LightField::Uniform { level: 250.0 },
            sensor: SensorModel {
                noise: 0.0,
                samples: 1,
            },
            ..Arena::default()
        };
        let mut robot = SimRobot::new(Pose::default(), 0, 0, arena, StdRng::seed_from_u64(0));
        assert_eq!(robot.ambient_light(), 250);
        assert_eq!(robot.light_level(), 250.0);
    }
}
