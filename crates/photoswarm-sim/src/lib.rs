//! Photoswarm Arena Simulation
//!
//! Runs unmodified [`Agent`](photoswarm_agent::Agent) controllers on
//! simulated robots so whole-swarm behavior can be observed and tested
//! without hardware.
//!
//! # Model
//!
//! - **Arena**: a walled square with a [`LightField`]; the sensor averages
//!   a burst of noisy samples per reading
//! - **Robots**: drive forward or pivot at fixed speeds; motion only
//!   happens while the controller pauses
//! - **Radio**: one broadcast per robot per transmission period, heard by
//!   every robot in range together with a noisy distance estimate
//! - **Clocks**: each robot powers up at a random time with a random tick
//!   counter
//!
//! Runs are fully determined by [`SimulationConfig::seed`].
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulation::new(SimulationConfig::default())?;
//! sim.run_until(120_000);
//! println!("{:?}", sim.snapshot().phases);
//! ```

mod config;
mod error;
mod events;
mod field;
mod radio;
mod robot;
mod simulation;

pub use config::{Placement, SimulationConfig, MAX_ROBOTS};
pub use error::{Error, Result};
pub use events::{PhaseCounts, RobotState, SwarmEvent, SwarmSnapshot};
pub use field::{LightField, SensorModel, MAX_READING};
pub use radio::{Radio, RadioConfig, RadioStats};
pub use robot::{Arena, Kinematics, Pose, SimRobot, BODY_RADIUS_MM};
pub use simulation::{Simulation, Summary};
