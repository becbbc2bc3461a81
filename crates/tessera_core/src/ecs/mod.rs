//! # Entity Component System
//!
//! Entities are generation-tagged ids, components are plain data stored in
//! one pre-sized column per kind, and systems are boxed behavior units that
//! track the entities whose signature matches theirs.
//!
//! ## Design Philosophy
//!
//! - Every capacity is fixed when the world is created
//! - Each manager owns its data; mutations that change a signature report to
//!   an explicit [`SignatureObserver`] instead of reaching into another manager
//! - Destroying an entity is deferred to the start of the next step

mod component;
mod dispatch;
mod entity;
mod registry;
mod signature;
mod slots;
mod storage;
mod system;
mod world;

pub use component::Component;
pub use dispatch::SystemRegistry;
pub use entity::{Entity, EntityId};
pub use registry::EntityRegistry;
pub use signature::{ComponentKind, Signature, SIGNATURE_BITS};
pub use slots::SlotArena;
pub use storage::{ComponentStorage, ComponentStore};
pub use system::{EntitySet, Membership, SignatureObserver, System, SystemId, SystemKind};
pub use world::{StepStats, World};
