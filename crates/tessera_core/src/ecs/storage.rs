//! # Component Storage
//!
//! Pre-sized component columns, one per kind, indexed by entity slot index.
//!
//! The storage uses a sparse column strategy:
//! - A column is allocated for the full entity capacity on first use of its kind
//! - Access is O(1) via entity index
//! - The store is the sole owner of component memory; entity records and
//!   systems only ever hold ids

use std::any::{type_name, Any};

use tracing::trace;

use crate::error::{EcsError, EcsResult, Subject};

use super::component::Component;
use super::entity::{Entity, EntityId};
use super::registry::EntityRegistry;
use super::signature::SIGNATURE_BITS;
use super::system::SignatureObserver;

/// Storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
#[derive(Debug)]
pub struct ComponentStorage<C> {
    /// One slot per entity index.
    data: Box<[Option<C>]>,
    /// Number of occupied slots.
    len: usize,
}

impl<C> ComponentStorage<C> {
    /// Creates new component storage with the specified capacity.
    ///
    /// All slots start empty.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let data = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        Self { data, len: 0 }
    }

    /// Returns the capacity of this storage.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gets a component by entity index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)?.as_ref()
    }

    /// Gets a mutable component by entity index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)?.as_mut()
    }

    /// Stores a component at the specified index, replacing any previous one.
    ///
    /// # Returns
    ///
    /// The stored component, or None if index was out of bounds.
    pub fn insert(&mut self, index: usize, component: C) -> Option<&mut C> {
        let slot = self.data.get_mut(index)?;
        if slot.is_none() {
            self.len += 1;
        }
        Some(slot.insert(component))
    }

    /// Removes the component at `index`, handing ownership back.
    pub fn remove(&mut self, index: usize) -> Option<C> {
        let value = self.data.get_mut(index)?.take()?;
        self.len -= 1;
        Some(value)
    }

    /// Iterates over stored components with their entity indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|c| (index, c)))
    }
}

/// Type-erased column, so columns of different types share one table.
trait ErasedStorage {
    /// Drops the component at `index`, if any.
    fn release(&mut self, index: usize) -> bool;
    fn len(&self) -> usize;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedStorage for ComponentStorage<C> {
    fn release(&mut self, index: usize) -> bool {
        self.remove(index).is_some()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owner of every component instance, indexed by `(kind, entity index)`.
pub struct ComponentStore {
    /// One column per kind; `None` until the kind is first attached.
    columns: Vec<Option<Box<dyn ErasedStorage>>>,
    /// Slots per column (the entity capacity).
    entity_capacity: usize,
}

impl ComponentStore {
    /// Creates an empty store for up to `entity_capacity` entities.
    #[must_use]
    pub fn new(entity_capacity: usize) -> Self {
        Self {
            columns: (0..SIGNATURE_BITS).map(|_| None).collect(),
            entity_capacity,
        }
    }

    /// Attaches a component to a live entity.
    ///
    /// Validates everything before touching any state, so a rejected attach
    /// leaves both the registry and the store unchanged. On success the
    /// entity's signature gains `C::ID` and `observer` is notified.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NotFound`] if the entity is not alive
    /// - [`EcsError::AlreadyPresent`] if the entity already has a `C`
    /// - [`EcsError::CapacityExceeded`] if the entity has no free slot for `C`
    /// - [`EcsError::KindCollision`] if another type already claimed `C::ID`
    pub fn attach<C: Component>(
        &mut self,
        registry: &mut EntityRegistry,
        observer: &mut dyn SignatureObserver,
        id: EntityId,
        component: C,
    ) -> EcsResult<&mut C> {
        registry.check_can_add(id, C::ID)?;
        self.check_kind::<C>()?;

        registry.add_component_kind(id, C::ID, observer)?;

        let capacity = self.entity_capacity;
        let column = self.columns[usize::from(C::ID)]
            .get_or_insert_with(|| -> Box<dyn ErasedStorage> {
                Box::new(ComponentStorage::<C>::new(capacity))
            });
        let storage = column
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()
            .ok_or_else(|| collision::<C>(type_name::<C>()))?;

        trace!(entity = %id, kind = C::ID, component = type_name::<C>(), "component attached");
        storage
            .insert(id.index() as usize, component)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))
    }

    /// Detaches a component, returning it to the caller.
    ///
    /// The component is destroyed when the returned value is dropped.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity is not alive or has no `C`;
    /// [`EcsError::KindCollision`] if `C::ID` belongs to another type.
    pub fn detach<C: Component>(
        &mut self,
        registry: &mut EntityRegistry,
        observer: &mut dyn SignatureObserver,
        id: EntityId,
    ) -> EcsResult<C> {
        let entity = registry.get(id)?;
        if !entity.has_component(C::ID) {
            return Err(EcsError::NotFound(Subject::Component { entity: id, kind: C::ID }));
        }
        self.check_kind::<C>()?;

        registry.remove_component_kind(id, C::ID, observer)?;

        trace!(entity = %id, kind = C::ID, "component detached");
        self.column_mut::<C>()?
            .remove(id.index() as usize)
            .ok_or(EcsError::NotFound(Subject::Component { entity: id, kind: C::ID }))
    }

    /// Gets a component.
    ///
    /// Entities marked for cleanup stay readable until they are compacted.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity is unknown or has no `C`;
    /// [`EcsError::KindCollision`] if `C::ID` belongs to another type.
    pub fn get<C: Component>(&self, registry: &EntityRegistry, id: EntityId) -> EcsResult<&C> {
        let missing = EcsError::NotFound(Subject::Component { entity: id, kind: C::ID });

        let entity = registry
            .record(id)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))?;
        if !entity.has_component(C::ID) {
            return Err(missing);
        }

        self.column::<C>()?
            .get(id.index() as usize)
            .ok_or(missing)
    }

    /// Gets a mutable component.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<C: Component>(
        &mut self,
        registry: &EntityRegistry,
        id: EntityId,
    ) -> EcsResult<&mut C> {
        let missing = EcsError::NotFound(Subject::Component { entity: id, kind: C::ID });

        let entity = registry
            .record(id)
            .ok_or(EcsError::NotFound(Subject::Entity(id)))?;
        if !entity.has_component(C::ID) {
            return Err(missing);
        }

        self.column_mut::<C>()?
            .get_mut(id.index() as usize)
            .ok_or(missing)
    }

    /// Typed view of one column, if that kind was ever attached.
    #[must_use]
    pub fn storage<C: Component>(&self) -> Option<&ComponentStorage<C>> {
        self.columns
            .get(usize::from(C::ID))?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentStorage<C>>()
    }

    /// Number of stored components of type `C`.
    #[must_use]
    pub fn count<C: Component>(&self) -> usize {
        self.storage::<C>().map_or(0, ComponentStorage::len)
    }

    /// Total number of stored components across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().flatten().map(|column| column.len()).sum()
    }

    /// Returns `true` if no component is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every component `entity` holds. Only the registry's compaction
    /// calls this, right before it clears the record's slot links.
    pub(crate) fn release(&mut self, entity: &Entity) -> usize {
        let index = entity.id().index() as usize;
        entity
            .component_kinds()
            .filter(|&kind| {
                self.columns
                    .get_mut(usize::from(kind))
                    .and_then(Option::as_mut)
                    .is_some_and(|column| column.release(index))
            })
            .count()
    }

    fn check_kind<C: Component>(&self) -> EcsResult<()> {
        match self.columns.get(usize::from(C::ID)).and_then(Option::as_ref) {
            Some(column) if !column.as_any().is::<ComponentStorage<C>>() => {
                Err(collision::<C>(column.type_name()))
            }
            _ => Ok(()),
        }
    }

    fn column<C: Component>(&self) -> EcsResult<&ComponentStorage<C>> {
        self.check_kind::<C>()?;
        self.storage::<C>()
            .ok_or(EcsError::NotFound(Subject::Component { entity: EntityId::NULL, kind: C::ID }))
    }

    fn column_mut<C: Component>(&mut self) -> EcsResult<&mut ComponentStorage<C>> {
        self.check_kind::<C>()?;
        self.columns
            .get_mut(usize::from(C::ID))
            .and_then(Option::as_mut)
            .and_then(|column| column.as_any_mut().downcast_mut::<ComponentStorage<C>>())
            .ok_or(EcsError::NotFound(Subject::Component { entity: EntityId::NULL, kind: C::ID }))
    }
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (kind, column) in self.columns.iter().enumerate() {
            if let Some(column) = column {
                map.entry(&kind, &format_args!("{} x{}", column.type_name(), column.len()));
            }
        }
        map.finish()
    }
}

fn collision<C: Component>(existing: &'static str) -> EcsError {
    EcsError::KindCollision {
        kind: C::ID,
        existing,
        requested: type_name::<C>(),
    }
}
