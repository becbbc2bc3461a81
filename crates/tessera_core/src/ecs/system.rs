//! # Systems
//!
//! A system is a behavior unit with a required signature. It is polymorphic
//! only over two capabilities: producing a per-step update and reacting to an
//! entity's signature changing. The registry is agnostic to anything else.

use std::any::Any;
use std::collections::BTreeSet;

use super::entity::{Entity, EntityId};
use super::signature::Signature;
use super::world::World;

/// Stable key identifying a system type inside a registry.
pub type SystemId = u32;

/// Per-step behavior over the entities matching a signature.
///
/// Systems are handed the owning [`World`] for the duration of their update
/// instead of holding a reference to it.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entity, EntitySet, Signature, System, SystemKind, World};
///
/// #[derive(Default)]
/// struct Census {
///     tracked: EntitySet,
///     last_seen: usize,
/// }
///
/// impl System for Census {
///     fn signature(&self) -> Signature {
///         Signature::EMPTY
///     }
///
///     fn update(&mut self, _world: &mut World, _delta_time: f32) {
///         self.last_seen = self.tracked.len();
///     }
///
///     fn on_entity_signature_changed(&mut self, entity: &Entity) {
///         self.tracked.observe(self.signature(), entity);
///     }
/// }
///
/// impl SystemKind for Census {
///     const ID: u32 = 1;
/// }
/// ```
pub trait System: 'static {
    /// Component kinds an entity must carry for this system to care about it.
    fn signature(&self) -> Signature;

    /// Advances this system by one step.
    fn update(&mut self, world: &mut World, delta_time: f32);

    /// Called when an entity is created, whenever its signature changes, when
    /// it is reclaimed, and once per live entity right after registration.
    fn on_entity_signature_changed(&mut self, entity: &Entity);

    /// Human-readable name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Compile-time identity of a system type.
pub trait SystemKind: System + Sized {
    /// Unique key among the system types registered in one world.
    const ID: SystemId;
}

/// Receives signature-change notifications.
///
/// Passed explicitly into every registry and store mutation so the managers
/// never reach into each other.
pub trait SignatureObserver {
    /// `entity` has gained or lost a component kind, or is being reclaimed.
    fn on_entity_signature_changed(&mut self, entity: &Entity);
}

/// Records changed ids for later delivery.
impl SignatureObserver for Vec<EntityId> {
    fn on_entity_signature_changed(&mut self, entity: &Entity) {
        self.push(entity.id());
    }
}

/// Object-safe view of a boxed system that can also be downcast.
pub(crate) trait ErasedSystem {
    fn update(&mut self, world: &mut World, delta_time: f32);
    fn on_entity_signature_changed(&mut self, entity: &Entity);
    fn name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> ErasedSystem for S {
    fn update(&mut self, world: &mut World, delta_time: f32) {
        System::update(self, world, delta_time);
    }

    fn on_entity_signature_changed(&mut self, entity: &Entity) {
        System::on_entity_signature_changed(self, entity);
    }

    fn name(&self) -> &'static str {
        System::name(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Outcome of [`EntitySet::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// The entity now matches and was added.
    Joined,
    /// The entity no longer matches and was removed.
    Left,
    /// Nothing changed.
    Unchanged,
}

/// The entities a system currently tracks, in id order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySet {
    members: BTreeSet<EntityId>,
}

impl EntitySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluates `entity` against `required`.
    pub fn observe(&mut self, required: Signature, entity: &Entity) -> Membership {
        let id = entity.id();
        if entity.matches(required) {
            if self.members.insert(id) {
                return Membership::Joined;
            }
        } else if self.members.remove(&id) {
            return Membership::Left;
        }
        Membership::Unchanged
    }

    /// Checks whether `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Checks whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over tracked ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// Snapshot of tracked ids, for loops that mutate the world.
    #[must_use]
    pub fn to_vec(&self) -> Vec<EntityId> {
        self.members.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_with(kinds: &[u8]) -> Entity {
        let mut entity = Entity::new(EntityId::new(0, 0));
        for &kind in kinds {
            entity.add_component(kind);
        }
        entity
    }

    #[test]
    fn test_membership_transitions() {
        let required = Signature::EMPTY.with(0).with(1);
        let mut set = EntitySet::new();

        let mut entity = entity_with(&[0]);
        assert_eq!(set.observe(required, &entity), Membership::Unchanged);

        entity.add_component(1);
        assert_eq!(set.observe(required, &entity), Membership::Joined);
        assert_eq!(set.observe(required, &entity), Membership::Unchanged);
        assert!(set.contains(entity.id()));

        entity.remove_component(0);
        assert_eq!(set.observe(required, &entity), Membership::Left);
        assert!(set.is_empty());
    }

    #[test]
    fn test_marked_entity_leaves() {
        let mut set = EntitySet::new();
        let mut entity = entity_with(&[3]);

        assert_eq!(set.observe(Signature::EMPTY, &entity), Membership::Joined);
        entity.mark_for_cleanup();
        assert_eq!(set.observe(Signature::EMPTY, &entity), Membership::Left);
    }

    #[test]
    fn test_pending_ids_observer() {
        let mut pending: Vec<EntityId> = Vec::new();
        let entity = entity_with(&[]);
        pending.on_entity_signature_changed(&entity);
        assert_eq!(pending, vec![entity.id()]);
    }
}
