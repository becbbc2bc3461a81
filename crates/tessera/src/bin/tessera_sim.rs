//! # TESSERA Simulation Runner
//!
//! Headless driver: loads a simulation file, spawns entity definitions and
//! runs the configured number of steps.
//!
//! ```bash
//! tessera_sim data/simulation.toml data/entities.toml
//!
//! # More detail
//! RUST_LOG=tessera_core=debug tessera_sim data/simulation.toml data/entities.toml
//! ```

use std::process::ExitCode;

use tessera::core::SpawnPolicy;
use tessera::{SimError, Simulation, SimulationConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: tessera_sim [SIMULATION.toml] [ENTITIES.toml]";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") || args.len() > 2 {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    match run(args.first().map(String::as_str), args.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<&str>, entities_path: Option<&str>) -> Result<(), SimError> {
    let config = match config_path {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    info!(
        max_entities = config.world.max_entities,
        steps = config.run.steps,
        fixed_delta = ?config.run.fixed_delta,
        "starting simulation"
    );

    let mut sim = Simulation::from_config(&config)?;
    if let Some(path) = entities_path {
        let report = sim.spawn_file(path, SpawnPolicy::SkipMalformed)?;
        info!(
            spawned = report.spawned.len(),
            skipped = report.skipped,
            "entities loaded"
        );
    }

    let summary = sim.run(config.run.steps)?;
    println!(
        "{} steps, {} entities reclaimed, {} alive",
        summary.steps, summary.reclaimed, summary.live_entities
    );
    Ok(())
}
