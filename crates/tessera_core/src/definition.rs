//! # Entity Definitions
//!
//! Builds entities from declarative TOML. Each `[[entity]]` table becomes one
//! `create_entity` call followed by one `attach` per component entry:
//!
//! ```toml
//! [[entity]]
//! name = "ship"
//! [entity.components]
//! position = { x = 0.0, y = 0.0 }
//! velocity = { x = 1.0, y = 0.0 }
//! ```
//!
//! Component keys are bound to Rust types with
//! [`DefinitionParser::register`]. Components of one entity are attached in
//! key order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ecs::{Component, ComponentKind, EntityId, World};
use crate::error::EcsError;

/// Errors raised while reading or instantiating definitions.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The definition file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not have the expected shape.
    #[error("malformed definitions: {0}")]
    Parse(#[from] toml::de::Error),

    /// A component key has no registered type.
    #[error("entity '{entity}': unknown component '{component}'")]
    UnknownComponent {
        /// Name of the entity definition.
        entity: String,
        /// The unbound key.
        component: String,
    },

    /// A component value does not deserialize into its registered type.
    #[error("entity '{entity}': invalid component '{component}': {source}")]
    InvalidComponent {
        /// Name of the entity definition.
        entity: String,
        /// The component key.
        component: String,
        /// Deserialization failure.
        source: toml::de::Error,
    },

    /// The world rejected an operation.
    #[error("entity '{entity}': {source}")]
    World {
        /// Name of the entity definition.
        entity: String,
        /// The rejection.
        source: EcsError,
    },
}

/// One `[[entity]]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDefinition {
    /// Label used in logs and errors.
    pub name: String,
    /// Component values keyed by registered name.
    #[serde(default)]
    pub components: BTreeMap<String, toml::Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    #[serde(default)]
    entity: Vec<EntityDefinition>,
}

/// What to do when one entity of a batch cannot be built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpawnPolicy {
    /// Stop and return the error. Entities already built stay.
    #[default]
    Abort,
    /// Log the error and move on to the next entity.
    SkipMalformed,
}

/// Outcome of a batch spawn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// Entities built, in document order.
    pub spawned: Vec<EntityId>,
    /// Definitions skipped under [`SpawnPolicy::SkipMalformed`].
    pub skipped: usize,
}

enum AttachFailure {
    Invalid(toml::de::Error),
    World(EcsError),
}

type AttachFn = Box<dyn Fn(&mut World, EntityId, toml::Value) -> Result<(), AttachFailure>>;

struct Binding {
    kind: ComponentKind,
    attach: AttachFn,
}

/// Maps component keys to types and turns definitions into entities.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use tessera_core::{Component, DefinitionParser, SpawnPolicy, World};
///
/// #[derive(Deserialize)]
/// struct Health {
///     current: u32,
/// }
///
/// impl Component for Health {
///     const ID: u8 = 0;
/// }
///
/// let mut parser = DefinitionParser::new();
/// parser.register::<Health>("health");
///
/// let mut world = World::default();
/// let report = parser
///     .spawn(&mut world, "[[entity]]\nname = \"crate\"\ncomponents.health = { current = 5 }", SpawnPolicy::Abort)
///     .unwrap();
///
/// assert_eq!(world.get::<Health>(report.spawned[0]).unwrap().current, 5);
/// ```
#[derive(Default)]
pub struct DefinitionParser {
    bindings: BTreeMap<String, Binding>,
}

impl DefinitionParser {
    /// Creates a parser with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a component key to `C`. A later binding for the same key
    /// replaces the earlier one.
    pub fn register<C>(&mut self, name: impl Into<String>) -> &mut Self
    where
        C: Component + DeserializeOwned,
    {
        let name = name.into();
        let attach: AttachFn = Box::new(|world: &mut World, id: EntityId, value: toml::Value| {
            let component = toml::Value::try_into::<C>(value).map_err(AttachFailure::Invalid)?;
            world.attach(id, component).map_err(AttachFailure::World)?;
            Ok(())
        });

        debug!(component = %name, kind = C::ID, "component binding registered");
        self.bindings.insert(name, Binding { kind: C::ID, attach });
        self
    }

    /// Kind bound to a key, if any.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ComponentKind> {
        self.bindings.get(name).map(|binding| binding.kind)
    }

    /// Parses a document into definitions without touching any world.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::Parse`] if the document is malformed.
    pub fn parse(&self, source: &str) -> Result<Vec<EntityDefinition>, DefinitionError> {
        let file: DefinitionFile = toml::from_str(source)?;
        Ok(file.entity)
    }

    /// Builds one entity.
    ///
    /// Unknown keys are rejected before anything is created. If an attach
    /// fails afterwards, the partially built entity is destroyed before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::UnknownComponent`], [`DefinitionError::InvalidComponent`]
    /// or [`DefinitionError::World`].
    pub fn instantiate(
        &self,
        world: &mut World,
        definition: &EntityDefinition,
    ) -> Result<EntityId, DefinitionError> {
        if let Some(component) = definition
            .components
            .keys()
            .find(|key| !self.bindings.contains_key(*key))
        {
            return Err(DefinitionError::UnknownComponent {
                entity: definition.name.clone(),
                component: component.clone(),
            });
        }

        let id = world.create_entity().map_err(|source| DefinitionError::World {
            entity: definition.name.clone(),
            source,
        })?;

        for (component, value) in &definition.components {
            let Some(binding) = self.bindings.get(component) else {
                continue;
            };
            if let Err(failure) = (binding.attach)(world, id, value.clone()) {
                if let Err(error) = world.destroy_entity(id) {
                    warn!(entity = %id, %error, "rollback of partial entity failed");
                }
                let entity = definition.name.clone();
                let component = component.clone();
                return Err(match failure {
                    AttachFailure::Invalid(source) => DefinitionError::InvalidComponent {
                        entity,
                        component,
                        source,
                    },
                    AttachFailure::World(source) => DefinitionError::World { entity, source },
                });
            }
        }

        debug!(entity = %id, name = %definition.name, "entity instantiated");
        Ok(id)
    }

    /// Parses a document and builds every entity in it.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::Parse`] for a malformed document. Under
    /// [`SpawnPolicy::Abort`], the first entity error as well.
    pub fn spawn(
        &self,
        world: &mut World,
        source: &str,
        policy: SpawnPolicy,
    ) -> Result<SpawnReport, DefinitionError> {
        let definitions = self.parse(source)?;
        let mut report = SpawnReport::default();

        for definition in &definitions {
            match self.instantiate(world, definition) {
                Ok(id) => report.spawned.push(id),
                Err(error) if policy == SpawnPolicy::SkipMalformed => {
                    warn!(%error, "skipping malformed entity definition");
                    report.skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }

        debug!(
            spawned = report.spawned.len(),
            skipped = report.skipped,
            "definitions spawned"
        );
        Ok(report)
    }

    /// Reads a file and spawns every entity in it.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::Io`] if the file cannot be read, otherwise as
    /// [`spawn`](Self::spawn).
    pub fn spawn_file(
        &self,
        world: &mut World,
        path: impl AsRef<Path>,
        policy: SpawnPolicy,
    ) -> Result<SpawnReport, DefinitionError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.spawn(world, &source, policy)
    }
}

impl std::fmt::Debug for DefinitionParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.bindings.iter().map(|(name, binding)| (name, binding.kind)))
            .finish()
    }
}
