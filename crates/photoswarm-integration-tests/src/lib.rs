//! Test bench for multi-robot scenarios.
//!
//! A [`BenchRobot`] pairs an agent with fixed, fully controllable hardware:
//! constant light, a constant random byte and a clock that only moves when
//! told to. [`exchange`] plays the radio for a group of robots that all
//! hear each other at the same distance.

use std::time::Duration;

use photoswarm_agent::{
    Actuator, Agent, AgentConfig, Clock, Color, Distance, Entropy, LightSensor, Motion, Phase,
    Result, Tick,
};
use photoswarm_wire::PeerId;

/// Hardware with fixed readings.
#[derive(Debug, Clone, Default)]
pub struct BenchHal {
    pub now: Tick,
    pub light: u16,
    pub byte: u8,
    pub motion: Motion,
    pub led: Color,
    pub paused: Duration,
    pub bursts: usize,
}

impl BenchHal {
    pub fn advance(&mut self, ticks: u32) {
        self.now = Tick(self.now.0.wrapping_add(ticks));
    }
}

impl Actuator for BenchHal {
    fn apply_motion(&mut self, motion: Motion) {
        self.motion = motion;
    }

    fn full_power(&mut self) {
        self.bursts += 1;
    }

    fn set_indicator(&mut self, color: Color) {
        self.led = color;
    }
}

impl LightSensor for BenchHal {
    fn ambient_light(&mut self) -> u16 {
        self.light
    }
}

impl Clock for BenchHal {
    fn now(&self) -> Tick {
        self.now
    }

    fn pause(&mut self, duration: Duration) {
        self.paused += duration;
        self.advance(Tick::from_duration(duration));
    }
}

impl Entropy for BenchHal {
    fn uniform_byte(&mut self) -> u8 {
        self.byte
    }
}

/// An agent on bench hardware.
#[derive(Debug)]
pub struct BenchRobot {
    pub agent: Agent,
    pub hal: BenchHal,
}

impl BenchRobot {
    pub fn new(id: u8, light: u16, config: AgentConfig) -> Result<Self> {
        Ok(Self {
            agent: Agent::new(PeerId(id), config)?,
            hal: BenchHal {
                light,
                ..BenchHal::default()
            },
        })
    }

    /// Power up with `config` minus the start-up pause.
    pub fn started(id: u8, light: u16, config: AgentConfig) -> Result<Self> {
        let mut robot = Self::new(id, light, config.with_startup(Duration::ZERO))?;
        robot.agent.start(&mut robot.hal);
        Ok(robot)
    }

    /// One control step followed by `ticks` of idle loop time.
    pub fn step(&mut self, ticks: u32) {
        self.agent.step(&mut self.hal);
        self.hal.advance(ticks);
    }

    pub fn phase(&self) -> Phase {
        self.agent.phase()
    }
}

/// Deliver every pending frame to every other robot at `distance`.
///
/// Robots are visited in order, so a reply armed by an early robot goes
/// out in the same call. Returns the number of frames sent.
pub fn exchange(robots: &mut [BenchRobot], distance: Distance) -> usize {
    let mut sent = 0;
    for sender in 0..robots.len() {
        let Some(frame) = robots[sender].agent.outbox().poll() else {
            continue;
        };
        robots[sender].agent.outbox_mut().acknowledge();
        sent += 1;

        for (index, robot) in robots.iter_mut().enumerate() {
            if index != sender {
                robot.agent.on_receive(&frame, distance);
            }
        }
    }
    sent
}

/// Exchange and step every robot until `done` holds or `max_steps` pass.
///
/// Returns the number of steps taken, or `None` on timeout.
pub fn run_until<F>(
    robots: &mut [BenchRobot],
    distance: Distance,
    max_steps: usize,
    done: F,
) -> Option<usize>
where
    F: Fn(&[BenchRobot]) -> bool,
{
    for steps in 0..max_steps {
        if done(robots) {
            return Some(steps);
        }
        exchange(robots, distance);
        for robot in robots.iter_mut() {
            robot.step(1);
        }
    }
    done(robots).then_some(max_steps)
}
