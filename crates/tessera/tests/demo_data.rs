//! # Demo Data Test
//!
//! The files shipped under `data/` load and run cleanly.

use std::path::PathBuf;

use tessera::core::SpawnPolicy;
use tessera::{LifetimeSystem, MovementSystem, Simulation, SimulationConfig};

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

/// Test: The demo run spawns every entity and expires the flare.
#[test]
fn test_demo_files_run() {
    let config = SimulationConfig::load(data_file("simulation.toml")).unwrap();
    assert_eq!(config.run.steps, 240);

    let mut sim = Simulation::from_config(&config).unwrap();
    let report = sim
        .spawn_file(data_file("entities.toml"), SpawnPolicy::Abort)
        .unwrap();
    assert_eq!(report.spawned.len(), 4);
    assert_eq!(report.skipped, 0);

    let summary = sim.run(config.run.steps).unwrap();
    assert_eq!(summary.steps, 240);
    assert_eq!(summary.reclaimed, 1);
    assert_eq!(summary.live_entities, 3);

    let world = sim.world();
    assert_eq!(world.system::<LifetimeSystem>().unwrap().expired(), 1);
    assert_eq!(world.system::<MovementSystem>().unwrap().tracked().len(), 2);
}
