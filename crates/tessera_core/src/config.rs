//! # World Configuration
//!
//! Capacities a [`World`](crate::World) is built with. All of them are hard
//! limits: exceeding one is an error, never a silent truncation.
//!
//! ```toml
//! max_entities = 4096
//! max_components_per_entity = 32
//! max_systems = 64
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::SIGNATURE_BITS;

/// Default entity capacity.
pub const MAX_ENTITIES: usize = 4096;

/// Default number of component slots per entity.
pub const MAX_COMPONENTS_PER_ENTITY: usize = 32;

/// Default number of active systems.
pub const MAX_SYSTEMS: usize = 64;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown keys.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Capacities of one world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of entities, including those awaiting cleanup.
    pub max_entities: usize,
    /// Component slots per entity, at most [`SIGNATURE_BITS`].
    pub max_components_per_entity: usize,
    /// Maximum number of active systems.
    pub max_systems: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            max_components_per_entity: MAX_COMPONENTS_PER_ENTITY,
            max_systems: MAX_SYSTEMS,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document. Missing keys take their default.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every capacity is in range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entities == 0 || u32::try_from(self.max_entities).is_err() {
            return Err(ConfigError::Invalid(format!(
                "max_entities must be within 1..={}, got {}",
                u32::MAX,
                self.max_entities
            )));
        }
        if !(1..=SIGNATURE_BITS).contains(&self.max_components_per_entity) {
            return Err(ConfigError::Invalid(format!(
                "max_components_per_entity must be within 1..={SIGNATURE_BITS}, got {}",
                self.max_components_per_entity
            )));
        }
        if self.max_systems == 0 {
            return Err(ConfigError::Invalid(
                "max_systems must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
