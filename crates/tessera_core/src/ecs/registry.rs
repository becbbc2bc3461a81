//! # Entity Registry
//!
//! Owns every entity record, issues and recycles ids, and keeps signatures in
//! step with the component store.
//!
//! Destruction is two-phase. [`EntityRegistry::destroy`] only marks the
//! record; the id keeps its slot, its components stay readable, and systems
//! keep tracking it. [`EntityRegistry::compact`], run once at the start of
//! every step, releases the components, notifies observers and frees the slot.

use tracing::{debug, trace};

use crate::error::{EcsError, EcsResult, Pool, Subject};

use super::entity::{Entity, EntityId};
use super::signature::{ComponentKind, SIGNATURE_BITS};
use super::slots::SlotArena;
use super::storage::ComponentStore;
use super::system::SignatureObserver;

/// Owner of all entity records.
#[derive(Debug)]
pub struct EntityRegistry {
    /// Entity records, generation-tagged.
    slots: SlotArena<Entity>,
    /// Entities marked for cleanup, in marking order.
    pending_cleanup: Vec<EntityId>,
    /// Component slots per entity.
    max_components: usize,
}

impl EntityRegistry {
    /// Creates a registry.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`, or if
    /// `max_components_per_entity` is zero or exceeds [`SIGNATURE_BITS`].
    #[must_use]
    pub fn new(max_entities: usize, max_components_per_entity: usize) -> Self {
        assert!(
            (1..=SIGNATURE_BITS).contains(&max_components_per_entity),
            "Component slots per entity must be within 1..={SIGNATURE_BITS}"
        );

        Self {
            slots: SlotArena::new(max_entities),
            pending_cleanup: Vec::new(),
            max_components: max_components_per_entity,
        }
    }

    /// Maximum number of entities, live or awaiting cleanup.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Component slots per entity.
    #[inline]
    #[must_use]
    pub const fn max_components_per_entity(&self) -> usize {
        self.max_components
    }

    /// Number of occupied entity slots, including entities awaiting cleanup.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no entity slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of entities marked for cleanup but not yet compacted.
    #[inline]
    #[must_use]
    pub fn pending_cleanup(&self) -> usize {
        self.pending_cleanup.len()
    }

    /// Allocates a new entity with an empty signature.
    ///
    /// # Errors
    ///
    /// [`EcsError::Full`] when every slot is occupied. Entities awaiting
    /// cleanup still occupy their slot.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        let id = self
            .slots
            .insert_with(Entity::new)
            .ok_or(EcsError::Full {
                pool: Pool::Entities,
                capacity: self.slots.capacity(),
            })?;

        trace!(entity = %id, "entity created");
        Ok(id)
    }

    /// Marks an entity for cleanup at the next compaction.
    ///
    /// # Returns
    ///
    /// `true` if the entity was newly marked, `false` if it already was.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the id is unknown or stale.
    pub fn destroy(&mut self, id: EntityId) -> EcsResult<bool> {
        let entity = self
            .slots
            .get_mut(id)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))?;

        if entity.is_marked_for_cleanup() {
            return Ok(false);
        }

        entity.mark_for_cleanup();
        self.pending_cleanup.push(id);
        trace!(entity = %id, "entity marked for cleanup");
        Ok(true)
    }

    /// Gets a live entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the id is unknown, stale, or marked for
    /// cleanup.
    pub fn get(&self, id: EntityId) -> EcsResult<&Entity> {
        self.slots
            .get(id)
            .filter(|entity| !entity.is_marked_for_cleanup())
            .ok_or(EcsError::NotFound(Subject::Entity(id)))
    }

    /// Gets a record whether or not it is marked for cleanup.
    #[inline]
    pub(crate) fn record(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id)
    }

    /// Checks if an entity is alive (issued and not marked for cleanup).
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_ok()
    }

    /// Iterates over live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots
            .iter()
            .map(|(_, entity)| entity)
            .filter(|entity| !entity.is_marked_for_cleanup())
    }

    /// Sets the signature bit for `kind` and notifies `observer`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NotFound`] if the entity is not alive
    /// - [`EcsError::AlreadyPresent`] if the kind is already set
    /// - [`EcsError::CapacityExceeded`] if every component slot is in use or
    ///   `kind` has no slot
    pub fn add_component_kind(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        observer: &mut dyn SignatureObserver,
    ) -> EcsResult<()> {
        self.check_can_add(id, kind)?;

        let entity = self
            .live_mut(id)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))?;
        entity.add_component(kind);
        observer.on_entity_signature_changed(entity);
        Ok(())
    }

    /// Validates an [`add_component_kind`](Self::add_component_kind) call
    /// without performing it.
    ///
    /// # Errors
    ///
    /// Same as [`add_component_kind`](Self::add_component_kind).
    pub fn check_can_add(&self, id: EntityId, kind: ComponentKind) -> EcsResult<()> {
        let entity = self.get(id)?;

        if entity.has_component(kind) {
            return Err(EcsError::AlreadyPresent(Subject::Component { entity: id, kind }));
        }

        if usize::from(kind) >= self.max_components
            || entity.component_count() >= self.max_components
        {
            return Err(EcsError::CapacityExceeded {
                entity: id,
                limit: self.max_components,
            });
        }

        Ok(())
    }

    /// Clears the signature bit for `kind` and notifies `observer`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity is not alive or lacks `kind`.
    pub fn remove_component_kind(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        observer: &mut dyn SignatureObserver,
    ) -> EcsResult<()> {
        let entity = self
            .live_mut(id)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))?;

        if !entity.has_component(kind) {
            return Err(EcsError::NotFound(Subject::Component { entity: id, kind }));
        }

        entity.remove_component(kind);
        observer.on_entity_signature_changed(entity);
        Ok(())
    }

    /// Reclaims every entity marked for cleanup.
    ///
    /// For each entity, in marking order: the store drops its components, the
    /// record's slot links are cleared, `observer` sees the (still marked,
    /// now empty) record, and finally the slot is freed for reuse under a new
    /// generation.
    ///
    /// # Returns
    ///
    /// Number of entities reclaimed.
    pub fn compact(
        &mut self,
        store: &mut ComponentStore,
        observer: &mut dyn SignatureObserver,
    ) -> usize {
        if self.pending_cleanup.is_empty() {
            return 0;
        }

        let pending = std::mem::take(&mut self.pending_cleanup);
        let mut reclaimed = 0;
        let mut released_components = 0;

        for id in pending {
            let Some(entity) = self.slots.get_mut(id) else {
                continue;
            };

            released_components += store.release(entity);
            entity.clear_components();
            observer.on_entity_signature_changed(entity);

            self.slots.remove(id);
            reclaimed += 1;
            trace!(entity = %id, "entity reclaimed");
        }

        debug!(
            reclaimed,
            released_components,
            live = self.slots.len(),
            "compaction finished"
        );
        reclaimed
    }

    fn live_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id)
            .filter(|entity| !entity.is_marked_for_cleanup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = EntityRegistry::new(1000, 32);
        assert_eq!(registry.capacity(), 1000);
        assert_eq!(registry.max_components_per_entity(), 32);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_until_full() {
        let mut registry = EntityRegistry::new(3, 8);
        for _ in 0..3 {
            registry.create().unwrap();
        }

        assert_eq!(
            registry.create(),
            Err(EcsError::Full { pool: Pool::Entities, capacity: 3 })
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_destroy_is_deferred_and_idempotent() {
        let mut registry = EntityRegistry::new(4, 8);
        let mut store = ComponentStore::new(4);
        let mut seen: Vec<EntityId> = Vec::new();

        let id = registry.create().unwrap();
        assert_eq!(registry.destroy(id), Ok(true));
        assert_eq!(registry.destroy(id), Ok(false));

        // Marked: not alive, but the slot is still held.
        assert!(!registry.is_alive(id));
        assert!(registry.record(id).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.pending_cleanup(), 1);

        assert_eq!(registry.compact(&mut store, &mut seen), 1);
        assert_eq!(seen, vec![id]);
        assert!(registry.is_empty());
        assert!(registry.record(id).is_none());
        assert_eq!(
            registry.destroy(id),
            Err(EcsError::NotFound(Subject::Entity(id)))
        );
    }

    #[test]
    fn test_full_counts_marked_entities() {
        let mut registry = EntityRegistry::new(1, 8);
        let mut store = ComponentStore::new(1);

        let id = registry.create().unwrap();
        registry.destroy(id).unwrap();
        assert!(registry.create().is_err());

        registry.compact(&mut store, &mut Vec::<EntityId>::new());
        let reused = registry.create().unwrap();
        assert_eq!(reused.index(), id.index());
        assert_ne!(reused, id);
    }

    #[test]
    fn test_component_kind_bookkeeping() {
        let mut registry = EntityRegistry::new(4, 2);
        let mut seen: Vec<EntityId> = Vec::new();
        let id = registry.create().unwrap();

        registry.add_component_kind(id, 0, &mut seen).unwrap();
        assert_eq!(
            registry.add_component_kind(id, 0, &mut seen),
            Err(EcsError::AlreadyPresent(Subject::Component { entity: id, kind: 0 }))
        );

        // Kind 5 has no slot when only two exist.
        assert_eq!(
            registry.add_component_kind(id, 5, &mut seen),
            Err(EcsError::CapacityExceeded { entity: id, limit: 2 })
        );

        registry.add_component_kind(id, 1, &mut seen).unwrap();
        assert_eq!(registry.get(id).unwrap().component_count(), 2);

        registry.remove_component_kind(id, 0, &mut seen).unwrap();
        assert_eq!(
            registry.remove_component_kind(id, 0, &mut seen),
            Err(EcsError::NotFound(Subject::Component { entity: id, kind: 0 }))
        );

        // One notification per successful mutation.
        assert_eq!(seen.len(), 3);
        assert_eq!(registry.get(id).unwrap().component_kinds().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_marked_entity_rejects_mutation() {
        let mut registry = EntityRegistry::new(4, 8);
        let id = registry.create().unwrap();
        registry.destroy(id).unwrap();

        assert!(matches!(
            registry.add_component_kind(id, 0, &mut Vec::<EntityId>::new()),
            Err(EcsError::NotFound(Subject::Entity(_)))
        ));
        assert_eq!(registry.iter().count(), 0);
    }
}
