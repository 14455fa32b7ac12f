//! Photoswarm simulator
//!
//! Runs a swarm and prints a JSON summary of the final state.
//!
//! ```text
//! photoswarm-sim [config.json] [--timeline]
//! ```
//!
//! Without a file argument the config comes from `PHOTOSWARM_*`
//! environment variables.

use std::env;
use std::process::ExitCode;

use photoswarm_sim::{Simulation, SimulationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photoswarm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let timeline = args.iter().any(|arg| arg == "--timeline");

    let config = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::from_env()?,
    };

    tracing::info!(
        robots = config.robot_count(),
        seed = config.seed,
        duration_ms = config.duration_ms,
        "starting simulation"
    );

    let mut sim = Simulation::new(config)?;
    sim.run();

    let summary = sim.summary();
    tracing::info!(
        dispersion = summary.snapshot.phases.dispersion,
        consensus = summary.snapshot.phases.consensus,
        chemotaxis = summary.snapshot.phases.chemotaxis,
        arrived = summary.snapshot.arrived,
        "simulation complete"
    );

    if timeline {
        println!("{}", serde_json::to_string_pretty(sim.events())?);
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
