//! # ECS Error Types
//!
//! All errors that can occur while mutating or querying a [`World`].
//! Every variant is locally recoverable: the rejected operation leaves the
//! world exactly as it was.
//!
//! [`World`]: crate::World

use std::fmt;

use thiserror::Error;

use crate::ecs::{ComponentKind, EntityId, SystemId};

/// Bounded pools that can run out of room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Live entity slots.
    Entities,
    /// Active system slots.
    Systems,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entities => f.write_str("entity"),
            Self::Systems => f.write_str("system"),
        }
    }
}

/// The thing a lookup or insertion was about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    /// An entity, by id.
    Entity(EntityId),
    /// A component of one kind on one entity.
    Component {
        /// Owning entity.
        entity: EntityId,
        /// Component kind index.
        kind: ComponentKind,
    },
    /// A system, by its kind id.
    System(SystemId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "entity {id}"),
            Self::Component { entity, kind } => write!(f, "component kind {kind} on entity {entity}"),
            Self::System(id) => write!(f, "system {id}"),
        }
    }
}

/// Errors that can occur in the ECS runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity or system capacity is exhausted.
    #[error("{pool} capacity exhausted ({capacity})")]
    Full {
        /// Which pool is full.
        pool: Pool,
        /// Configured capacity of that pool.
        capacity: usize,
    },

    /// The per-entity component slot limit would be exceeded.
    #[error("entity {entity} cannot hold another component (limit {limit})")]
    CapacityExceeded {
        /// The entity that is full.
        entity: EntityId,
        /// Configured component slots per entity.
        limit: usize,
    },

    /// One component per kind per entity, one system per kind per world.
    #[error("{0} already present")]
    AlreadyPresent(Subject),

    /// Lookup by id or kind failed.
    #[error("{0} not found")]
    NotFound(Subject),

    /// Structural mutation attempted while systems are being dispatched.
    #[error("cannot {operation} while systems are being dispatched")]
    ReentrantMutation {
        /// The rejected operation.
        operation: &'static str,
    },

    /// Two different component types claim the same kind index.
    #[error("component kind {kind} is bound to `{existing}`, not `{requested}`")]
    KindCollision {
        /// The contested kind index.
        kind: ComponentKind,
        /// Type that first claimed the kind.
        existing: &'static str,
        /// Type that tried to reuse it.
        requested: &'static str,
    },
}

impl EcsError {
    /// Returns `true` for failed lookups, which are routine rather than
    /// content errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
