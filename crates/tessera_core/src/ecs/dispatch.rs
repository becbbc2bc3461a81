//! # System Registry
//!
//! Owns the active systems in a dense array and routes updates and
//! signature-change notifications to them.
//!
//! ## Ordering
//!
//! Systems run in dense-array order. Registration appends; deregistration
//! moves the last system into the hole, so removing a system can change the
//! relative order of the others. Removal stays O(1) and the array never has
//! gaps.
//!
//! ## Dispatch protocol
//!
//! ```text
//! begin_dispatch()           snapshot count, reject structural mutation
//! for index in 0..count:
//!     checkout(index)        take the system out of its slot
//!     system.update(world)   the world is fully usable, minus this system
//!     checkin(index)         put it back
//! end_dispatch()
//! ```

use std::any::type_name;

use tracing::debug;

use crate::error::{EcsError, EcsResult, Pool, Subject};

use super::entity::Entity;
use super::signature::Signature;
use super::system::{ErasedSystem, SignatureObserver, System, SystemId, SystemKind};

/// One active system and its registration data.
struct SystemSlot {
    id: SystemId,
    name: &'static str,
    signature: Signature,
    /// `None` only while the system is checked out for its own update.
    system: Option<Box<dyn ErasedSystem>>,
}

/// Dense registry of active systems.
pub struct SystemRegistry {
    active: Vec<SystemSlot>,
    capacity: usize,
    dispatching: bool,
}

impl SystemRegistry {
    /// Creates an empty registry.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            active: Vec::with_capacity(capacity),
            capacity,
            dispatching: false,
        }
    }

    /// Maximum number of active systems.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if no system is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether an update sweep is in progress.
    #[inline]
    #[must_use]
    pub const fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Active system ids in dispatch order.
    #[must_use]
    pub fn ids(&self) -> Vec<SystemId> {
        self.active.iter().map(|slot| slot.id).collect()
    }

    /// Registers a system at the next dense index.
    ///
    /// # Returns
    ///
    /// The index assigned to the system.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ReentrantMutation`] during an update sweep
    /// - [`EcsError::AlreadyPresent`] if a system with `S::ID` is active
    /// - [`EcsError::Full`] when every system slot is taken
    pub fn register<S: SystemKind>(&mut self, system: S) -> EcsResult<usize> {
        if self.dispatching {
            return Err(EcsError::ReentrantMutation { operation: "register a system" });
        }
        if self.position(S::ID).is_some() {
            return Err(EcsError::AlreadyPresent(Subject::System(S::ID)));
        }
        if self.active.len() >= self.capacity {
            return Err(EcsError::Full {
                pool: Pool::Systems,
                capacity: self.capacity,
            });
        }

        let index = self.active.len();
        let name = System::name(&system);
        self.active.push(SystemSlot {
            id: S::ID,
            name,
            signature: system.signature(),
            system: Some(Box::new(system)),
        });

        debug!(system = name, id = S::ID, index, "system registered");
        Ok(index)
    }

    /// Deregisters and drops the system registered under `S::ID`.
    ///
    /// The last active system takes over the freed index.
    ///
    /// # Returns
    ///
    /// `false` if no such system was active.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] during an update sweep.
    pub fn deregister<S: SystemKind>(&mut self) -> EcsResult<bool> {
        if self.dispatching {
            return Err(EcsError::ReentrantMutation { operation: "deregister a system" });
        }
        let Some(index) = self.position(S::ID) else {
            return Ok(false);
        };

        let removed = self.active.swap_remove(index);
        if let Some(moved) = self.active.get(index) {
            debug!(system = moved.name, from = self.active.len(), to = index, "system re-indexed");
        }
        debug!(system = removed.name, id = removed.id, "system deregistered");
        Ok(true)
    }

    /// Dense index of the system registered under `S::ID`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if no such system is active.
    pub fn index_of<S: SystemKind>(&self) -> EcsResult<usize> {
        self.position(S::ID)
            .ok_or(EcsError::NotFound(Subject::System(S::ID)))
    }

    /// Required signature declared by the system at `S::ID`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if no such system is active.
    pub fn signature_of<S: SystemKind>(&self) -> EcsResult<Signature> {
        Ok(self.active[self.index_of::<S>()?].signature)
    }

    /// Gets a system by kind.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if no such system is active, or if it is the
    /// system currently running its own update.
    pub fn get<S: SystemKind>(&self) -> EcsResult<&S> {
        self.active
            .iter()
            .find(|slot| slot.id == S::ID)
            .and_then(|slot| slot.system.as_deref())
            .and_then(|system| system.as_any().downcast_ref::<S>())
            .ok_or(EcsError::NotFound(Subject::System(S::ID)))
    }

    /// Gets a system by kind, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<S: SystemKind>(&mut self) -> EcsResult<&mut S> {
        self.active
            .iter_mut()
            .find(|slot| slot.id == S::ID)
            .and_then(|slot| slot.system.as_deref_mut())
            .and_then(|system| system.as_any_mut().downcast_mut::<S>())
            .ok_or(EcsError::NotFound(Subject::System(S::ID)))
    }

    /// Forwards a signature change to every active system, in dense order.
    pub fn notify_all(&mut self, entity: &Entity) {
        for system in self.active.iter_mut().filter_map(|slot| slot.system.as_mut()) {
            system.on_entity_signature_changed(entity);
        }
    }

    /// Forwards a signature change to the system at `index` only.
    pub(crate) fn notify_one(&mut self, index: usize, entity: &Entity) {
        if let Some(system) = self.active.get_mut(index).and_then(|slot| slot.system.as_mut()) {
            system.on_entity_signature_changed(entity);
        }
    }

    /// Starts an update sweep.
    ///
    /// # Returns
    ///
    /// The number of systems to visit.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] if a sweep is already running.
    pub(crate) fn begin_dispatch(&mut self) -> EcsResult<usize> {
        if self.dispatching {
            return Err(EcsError::ReentrantMutation { operation: "start a nested update sweep" });
        }
        self.dispatching = true;
        Ok(self.active.len())
    }

    pub(crate) fn checkout(&mut self, index: usize) -> Option<Box<dyn ErasedSystem>> {
        self.active.get_mut(index)?.system.take()
    }

    pub(crate) fn checkin(&mut self, index: usize, system: Box<dyn ErasedSystem>) {
        if let Some(slot) = self.active.get_mut(index) {
            slot.system = Some(system);
        }
    }

    pub(crate) fn end_dispatch(&mut self) {
        self.dispatching = false;
    }

    /// Drops every system. Used at world teardown.
    ///
    /// # Returns
    ///
    /// Number of systems removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.active.len();
        for slot in self.active.drain(..) {
            debug!(system = slot.name, id = slot.id, "system removed at teardown");
        }
        removed
    }

    fn position(&self, id: SystemId) -> Option<usize> {
        self.active.iter().position(|slot| slot.id == id)
    }
}

impl SignatureObserver for SystemRegistry {
    fn on_entity_signature_changed(&mut self, entity: &Entity) {
        self.notify_all(entity);
    }
}

impl std::fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("active", &self.active.iter().map(|slot| slot.name).collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .field("dispatching", &self.dispatching)
            .finish()
    }
}
