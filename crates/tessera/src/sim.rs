//! # Simulation Driver
//!
//! Owns a [`World`] with the demo systems registered, a definition parser
//! bound to the demo components, and the timer that feeds each step.
//!
//! ```toml
//! [world]
//! max_entities = 1024
//!
//! [run]
//! steps = 120
//! fixed_delta = 0.016   # omit to use the wall clock
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_core::{
    ConfigError, DefinitionError, DefinitionParser, EcsError, SpawnPolicy, SpawnReport,
    StepStats, World, WorldConfig,
};
use tessera_shared::{DeltaSource, FixedStep, FrameClock};
use thiserror::Error;
use tracing::{debug, info};

use crate::components::{Lifetime, Position, Velocity};
use crate::systems::{LifetimeSystem, MovementSystem};

/// Errors raised by the simulation driver.
#[derive(Error, Debug)]
pub enum SimError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The simulation file is malformed.
    #[error("malformed simulation config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The world configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Entity definitions could not be spawned.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The world rejected an operation.
    #[error(transparent)]
    World(#[from] EcsError),
}

/// How long to run and how to measure time.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Number of steps to run.
    pub steps: u64,
    /// Seconds per step. `None` measures the wall clock instead.
    pub fixed_delta: Option<f32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 60,
            fixed_delta: Some(1.0 / 60.0),
        }
    }
}

/// Contents of a simulation file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// World capacities.
    pub world: WorldConfig,
    /// Run length and timing.
    pub run: RunConfig,
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`SimError::Parse`] or [`SimError::Config`].
    pub fn from_toml_str(source: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(source)?;
        config.world.validate()?;
        if let Some(delta) = config.run.fixed_delta {
            if !(delta.is_finite() && delta >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "run.fixed_delta must be a non-negative number, got {delta}"
                ))
                .into());
            }
        }
        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`], otherwise as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Timer matching [`RunConfig::fixed_delta`].
    #[must_use]
    pub fn timer(&self) -> Box<dyn DeltaSource> {
        match self.run.fixed_delta {
            Some(delta) => Box::new(FixedStep::new(delta)),
            None => Box::new(FrameClock::new()),
        }
    }
}

/// Totals of a [`Simulation::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed.
    pub steps: u64,
    /// Entities reclaimed across all steps.
    pub reclaimed: usize,
    /// Live entities at the end.
    pub live_entities: usize,
}

/// A world plus the systems and timer that drive it.
pub struct Simulation {
    world: World,
    parser: DefinitionParser,
    timer: Box<dyn DeltaSource>,
}

impl Simulation {
    /// Builds a world and registers the demo systems.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] for invalid capacities, [`SimError::World`] if
    /// the systems do not fit.
    pub fn new(config: WorldConfig, timer: Box<dyn DeltaSource>) -> Result<Self, SimError> {
        let mut world = World::try_new(config)?;
        world.register_system(MovementSystem::default())?;
        world.register_system(LifetimeSystem::default())?;

        let mut parser = DefinitionParser::new();
        parser
            .register::<Position>("position")
            .register::<Velocity>("velocity")
            .register::<Lifetime>("lifetime");

        Ok(Self {
            world,
            parser,
            timer,
        })
    }

    /// Builds a simulation from a parsed simulation file.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimError> {
        Self::new(config.world.clone(), config.timer())
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulated world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Spawns entities from a definition document.
    ///
    /// # Errors
    ///
    /// [`SimError::Definition`].
    pub fn spawn(&mut self, source: &str, policy: SpawnPolicy) -> Result<SpawnReport, SimError> {
        Ok(self.parser.spawn(&mut self.world, source, policy)?)
    }

    /// Spawns entities from a definition file.
    ///
    /// # Errors
    ///
    /// [`SimError::Definition`].
    pub fn spawn_file(
        &mut self,
        path: impl AsRef<Path>,
        policy: SpawnPolicy,
    ) -> Result<SpawnReport, SimError> {
        Ok(self.parser.spawn_file(&mut self.world, path, policy)?)
    }

    /// Advances one step using the next timer delta.
    ///
    /// # Errors
    ///
    /// [`SimError::World`].
    pub fn tick(&mut self) -> Result<StepStats, SimError> {
        let delta = self.timer.tick();
        Ok(self.world.step(delta)?)
    }

    /// Runs `steps` ticks.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick.
    pub fn run(&mut self, steps: u64) -> Result<RunSummary, SimError> {
        let mut summary = RunSummary::default();

        for _ in 0..steps {
            let stats = self.tick()?;
            summary.steps += 1;
            summary.reclaimed += stats.reclaimed;
            debug!(
                step = stats.step,
                reclaimed = stats.reclaimed,
                live = self.world.entity_count(),
                "tick"
            );
        }

        summary.live_entities = self.world.entity_count();
        info!(
            steps = summary.steps,
            reclaimed = summary.reclaimed,
            live = summary.live_entities,
            simulated_seconds = self.timer.total_time(),
            "run finished"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("parser", &self.parser)
            .field("frames", &self.timer.frame_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_shared::Vec2;

    const FLEET: &str = r#"
        [[entity]]
        name = "ship"
        [entity.components]
        position = { x = 0.0, y = 0.0 }
        velocity = { x = 2.0, y = 0.0 }

        [[entity]]
        name = "flare"
        [entity.components]
        position = { x = 5.0, y = 5.0 }
        lifetime = 0.5
    "#;

    fn fixed(delta: f32) -> Simulation {
        Simulation::new(WorldConfig::default(), Box::new(FixedStep::new(delta))).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.run.steps, 60);
    }

    #[test]
    fn test_config_sections() {
        let config = SimulationConfig::from_toml_str(
            "[world]\nmax_entities = 10\n[run]\nsteps = 3\nfixed_delta = 0.5",
        )
        .unwrap();
        assert_eq!(config.world.max_entities, 10);
        assert_eq!(config.run, RunConfig { steps: 3, fixed_delta: Some(0.5) });
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[world]\nmax_systems = 0"),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[run]\nfixed_delta = -1.0"),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[run]\nspeed = 2"),
            Err(SimError::Parse(_))
        ));
    }

    #[test]
    fn test_run_moves_and_expires() {
        let mut sim = fixed(0.25);
        let report = sim.spawn(FLEET, SpawnPolicy::Abort).unwrap();
        let ship = report.spawned[0];

        let summary = sim.run(4).unwrap();
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.reclaimed, 1);
        assert_eq!(summary.live_entities, 1);
        assert_eq!(
            sim.world().get::<Position>(ship).unwrap().0,
            Vec2::new(2.0, 0.0)
        );
    }

    #[test]
    fn test_systems_do_not_fit() {
        let config = WorldConfig {
            max_systems: 1,
            ..WorldConfig::default()
        };
        let result = Simulation::new(config, Box::new(FixedStep::new(0.1)));
        assert!(matches!(result, Err(SimError::World(EcsError::Full { .. }))));
    }
}
