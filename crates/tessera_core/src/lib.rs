//! # TESSERA Core Runtime
//!
//! Capacity-bounded Entity Component System:
//! - Generational entity ids, never aliased after reuse
//! - One component per kind per entity, tracked by a 64-bit signature
//! - Systems notified whenever a signature changes
//!
//! ## Architecture Rules
//!
//! 1. **Every capacity is a hard limit** - exceeding one is an error
//! 2. **Managers never reach into each other** - signature changes flow
//!    through an explicit [`SignatureObserver`]
//! 3. **Destruction is deferred** - destroyed entities are reclaimed at the
//!    start of the next step, so systems never see a component vanish
//!    mid-update
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Component, Entity, EntitySet, Signature, System, SystemKind, World};
//!
//! struct Position(f32);
//! struct Speed(f32);
//!
//! impl Component for Position {
//!     const ID: u8 = 0;
//! }
//!
//! impl Component for Speed {
//!     const ID: u8 = 1;
//! }
//!
//! #[derive(Default)]
//! struct Movement {
//!     tracked: EntitySet,
//! }
//!
//! impl System for Movement {
//!     fn signature(&self) -> Signature {
//!         Signature::of::<Position>() | Signature::of::<Speed>()
//!     }
//!
//!     fn update(&mut self, world: &mut World, delta_time: f32) {
//!         for id in self.tracked.to_vec() {
//!             let speed = world.get::<Speed>(id).map_or(0.0, |s| s.0);
//!             if let Ok(position) = world.get_mut::<Position>(id) {
//!                 position.0 += speed * delta_time;
//!             }
//!         }
//!     }
//!
//!     fn on_entity_signature_changed(&mut self, entity: &Entity) {
//!         self.tracked.observe(self.signature(), entity);
//!     }
//! }
//!
//! impl SystemKind for Movement {
//!     const ID: u32 = 0;
//! }
//!
//! let mut world = World::default();
//! world.register_system(Movement::default()).unwrap();
//!
//! let id = world.create_entity().unwrap();
//! world.attach(id, Position(0.0)).unwrap();
//! world.attach(id, Speed(2.0)).unwrap();
//!
//! world.step(0.5).unwrap();
//! assert_eq!(world.get::<Position>(id).unwrap().0, 1.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod definition;
pub mod ecs;
pub mod error;

pub use config::{ConfigError, WorldConfig, MAX_COMPONENTS_PER_ENTITY, MAX_ENTITIES, MAX_SYSTEMS};
pub use definition::{DefinitionError, DefinitionParser, EntityDefinition, SpawnPolicy, SpawnReport};
pub use ecs::{
    Component, ComponentKind, ComponentStorage, ComponentStore, Entity, EntityId, EntityRegistry,
    EntitySet, Membership, Signature, SignatureObserver, SlotArena, StepStats, System, SystemId,
    SystemKind, SystemRegistry, World, SIGNATURE_BITS,
};
pub use error::{EcsError, EcsResult, Pool, Subject};
