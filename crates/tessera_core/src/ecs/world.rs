//! # ECS World
//!
//! The facade that owns one [`EntityRegistry`], one [`ComponentStore`] and
//! one [`SystemRegistry`] and wires them together.
//!
//! ## Step
//!
//! ```text
//! step(delta)
//!  ├─ compact()          reclaim entities destroyed during the last step
//!  └─ update_all(delta)  run every system once, in dense order
//! ```
//!
//! Signature changes made while systems run are queued and delivered to every
//! system after the system that caused them returns.

use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, WorldConfig};
use crate::error::{EcsError, EcsResult};

use super::component::Component;
use super::dispatch::SystemRegistry;
use super::entity::{Entity, EntityId};
use super::registry::EntityRegistry;
use super::storage::ComponentStore;
use super::system::{SignatureObserver, SystemKind};

/// Summary of one [`World::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Number of the step just completed, starting at 1.
    pub step: u64,
    /// Entities reclaimed by the compaction that opened the step.
    pub reclaimed: usize,
    /// Systems that ran their update.
    pub systems_updated: usize,
}

/// The ECS World - container for all entities, components and systems.
///
/// Every capacity is fixed at creation by the [`WorldConfig`]. Exceeding one
/// is an error, never a silent truncation.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, World, WorldConfig};
///
/// struct Health(u32);
///
/// impl Component for Health {
///     const ID: u8 = 0;
/// }
///
/// let mut world = World::new(WorldConfig::default());
/// let id = world.create_entity().unwrap();
/// world.attach(id, Health(10)).unwrap();
///
/// world.get_mut::<Health>(id).unwrap().0 -= 3;
/// assert_eq!(world.get::<Health>(id).unwrap().0, 7);
/// ```
#[derive(Debug)]
pub struct World {
    entities: EntityRegistry,
    components: ComponentStore,
    systems: SystemRegistry,
    /// Entities whose signature changed while systems were dispatching.
    deferred: Vec<EntityId>,
    step_count: u64,
    config: WorldConfig,
}

impl World {
    /// Creates a world with the given capacities.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails [`WorldConfig::validate`]. Use
    /// [`try_new`](Self::try_new) for configurations read at runtime.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        match Self::try_new(config) {
            Ok(world) => world,
            Err(error) => panic!("invalid world configuration: {error}"),
        }
    }

    /// Creates a world after validating the configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a capacity is out of range.
    pub fn try_new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            max_entities = config.max_entities,
            max_components_per_entity = config.max_components_per_entity,
            max_systems = config.max_systems,
            "world created"
        );

        Ok(Self {
            entities: EntityRegistry::new(config.max_entities, config.max_components_per_entity),
            components: ComponentStore::new(config.max_entities),
            systems: SystemRegistry::new(config.max_systems),
            deferred: Vec::new(),
            step_count: 0,
            config,
        })
    }

    /// Capacities this world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed steps.
    #[inline]
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Every system is notified, so systems with an empty signature track
    /// the new entity. While systems run the notification is queued.
    ///
    /// # Errors
    ///
    /// [`EcsError::Full`] when `max_entities` slots are taken. Entities
    /// destroyed in the current step still hold their slot.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let id = logged("create entity", self.entities.create())?;
        if let Some(entity) = self.entities.record(id) {
            observer(&mut self.systems, &mut self.deferred).on_entity_signature_changed(entity);
        }
        Ok(id)
    }

    /// Destroys an entity at the start of the next step.
    ///
    /// The entity stops being alive immediately, but its components remain
    /// readable and systems keep tracking it until compaction.
    ///
    /// # Returns
    ///
    /// `false` if the entity was already destroyed in this step.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the id is unknown or stale.
    pub fn destroy_entity(&mut self, id: EntityId) -> EcsResult<bool> {
        logged("destroy entity", self.entities.destroy(id))
    }

    /// Gets a live entity record.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity is unknown or destroyed.
    pub fn entity(&self, id: EntityId) -> EcsResult<&Entity> {
        self.entities.get(id)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    /// Number of live entities, excluding those awaiting cleanup.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len() - self.entities.pending_cleanup()
    }

    /// Iterates over live entities.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Read access to the entity registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.entities
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a component to a live entity.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NotFound`] if the entity is not alive
    /// - [`EcsError::AlreadyPresent`] if it already has a `C`
    /// - [`EcsError::CapacityExceeded`] if it has no free component slot
    /// - [`EcsError::KindCollision`] if another type owns `C::ID`
    pub fn attach<C: Component>(&mut self, id: EntityId, component: C) -> EcsResult<&mut C> {
        let observer = observer(&mut self.systems, &mut self.deferred);
        logged(
            "attach component",
            self.components.attach(&mut self.entities, observer, id, component),
        )
    }

    /// Detaches and returns a component.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity is not alive or has no `C`.
    pub fn detach<C: Component>(&mut self, id: EntityId) -> EcsResult<C> {
        let observer = observer(&mut self.systems, &mut self.deferred);
        logged(
            "detach component",
            self.components.detach::<C>(&mut self.entities, observer, id),
        )
    }

    /// Gets a component. Destroyed entities stay readable until compaction.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity or the component is absent.
    pub fn get<C: Component>(&self, id: EntityId) -> EcsResult<&C> {
        self.components.get::<C>(&self.entities, id)
    }

    /// Gets a component mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the entity or the component is absent.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> EcsResult<&mut C> {
        self.components.get_mut::<C>(&self.entities, id)
    }

    /// Checks whether an entity currently holds a `C`.
    #[must_use]
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.get::<C>(id).is_ok()
    }

    /// Read access to the component store.
    #[inline]
    #[must_use]
    pub const fn components(&self) -> &ComponentStore {
        &self.components
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system and introduces every live entity to it.
    ///
    /// # Returns
    ///
    /// The system's dense index.
    ///
    /// # Errors
    ///
    /// - [`EcsError::Full`] at `max_systems`
    /// - [`EcsError::AlreadyPresent`] if a system with `S::ID` is active
    /// - [`EcsError::ReentrantMutation`] while systems are dispatching
    pub fn register_system<S: SystemKind>(&mut self, system: S) -> EcsResult<usize> {
        let index = logged("register system", self.systems.register(system))?;

        for entity in self.entities.iter() {
            self.systems.notify_one(index, entity);
        }
        Ok(index)
    }

    /// Deregisters and drops a system.
    ///
    /// The last system moves into the freed index, so the update order of the
    /// remaining systems may change.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] while systems are dispatching.
    pub fn deregister_system<S: SystemKind>(&mut self) -> EcsResult<bool> {
        logged("deregister system", self.systems.deregister::<S>())
    }

    /// Gets a registered system.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotFound`] if the system is not registered, or is the one
    /// currently updating.
    pub fn system<S: SystemKind>(&self) -> EcsResult<&S> {
        self.systems.get::<S>()
    }

    /// Gets a registered system mutably.
    ///
    /// # Errors
    ///
    /// Same as [`system`](Self::system).
    pub fn system_mut<S: SystemKind>(&mut self) -> EcsResult<&mut S> {
        self.systems.get_mut::<S>()
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Read access to the system registry.
    #[inline]
    #[must_use]
    pub const fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Reclaims every entity destroyed since the last compaction.
    ///
    /// [`step`](Self::step) calls this first; calling it directly is only
    /// needed outside the step loop.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] while systems are dispatching.
    pub fn compact(&mut self) -> EcsResult<usize> {
        if self.systems.is_dispatching() {
            return logged(
                "compact",
                Err(EcsError::ReentrantMutation { operation: "compact the world" }),
            );
        }
        Ok(self.entities.compact(&mut self.components, &mut self.systems))
    }

    /// Runs every system's update once, in dense order.
    ///
    /// # Returns
    ///
    /// Number of systems updated.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] when called from inside a system.
    pub fn update_all(&mut self, delta_time: f32) -> EcsResult<usize> {
        let count = logged("update systems", self.systems.begin_dispatch())?;
        let mut updated = 0;

        for index in 0..count {
            let Some(mut system) = self.systems.checkout(index) else {
                continue;
            };

            trace!(system = system.name(), index, "system update");
            system.update(self, delta_time);
            self.systems.checkin(index, system);
            self.flush_deferred();
            updated += 1;
        }

        self.systems.end_dispatch();
        Ok(updated)
    }

    /// Advances the world by one step: compaction, then every system update.
    ///
    /// # Errors
    ///
    /// [`EcsError::ReentrantMutation`] when called from inside a system.
    pub fn step(&mut self, delta_time: f32) -> EcsResult<StepStats> {
        let reclaimed = self.compact()?;
        let systems_updated = self.update_all(delta_time)?;
        self.step_count += 1;

        trace!(step = self.step_count, reclaimed, systems_updated, "step finished");
        Ok(StepStats {
            step: self.step_count,
            reclaimed,
            systems_updated,
        })
    }

    /// Delivers queued signature changes to every system.
    ///
    /// Entities destroyed since the change was queued are skipped. Systems
    /// keep tracking them until compaction delivers the final notice.
    fn flush_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }

        let mut pending = std::mem::take(&mut self.deferred);
        for &id in &pending {
            match self.entities.record(id) {
                Some(entity) if !entity.is_marked_for_cleanup() => {
                    self.systems.notify_all(entity);
                }
                _ => {}
            }
        }
        // Keep the allocation for the next system.
        pending.clear();
        self.deferred = pending;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl Drop for World {
    fn drop(&mut self) {
        let removed = self.systems.clear();
        debug!(
            systems = removed,
            entities = self.entities.len(),
            steps = self.step_count,
            "world torn down"
        );
    }
}

/// Picks where signature changes go: straight to the systems, or onto the
/// queue while one of them is checked out.
fn observer<'a>(
    systems: &'a mut SystemRegistry,
    deferred: &'a mut Vec<EntityId>,
) -> &'a mut dyn SignatureObserver {
    if systems.is_dispatching() {
        deferred
    } else {
        systems
    }
}

/// Logs a rejected operation and passes the result through unchanged.
fn logged<T>(operation: &'static str, result: EcsResult<T>) -> EcsResult<T> {
    result.map_err(|error| {
        if error.is_not_found() {
            debug!(operation, %error, "operation rejected");
        } else {
            warn!(operation, %error, "operation rejected");
        }
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{EntitySet, Signature, System};

    struct Tag(u32);

    impl Component for Tag {
        const ID: u8 = 0;
    }

    struct Mass(f32);

    impl Component for Mass {
        const ID: u8 = 1;
    }

    /// Tracks entities matching a signature and counts its updates.
    struct Tracker<const N: u32> {
        required: Signature,
        tracked: EntitySet,
        updates: usize,
    }

    impl<const N: u32> Tracker<N> {
        fn new(required: Signature) -> Self {
            Self {
                required,
                tracked: EntitySet::new(),
                updates: 0,
            }
        }
    }

    impl<const N: u32> System for Tracker<N> {
        fn signature(&self) -> Signature {
            self.required
        }

        fn update(&mut self, _world: &mut World, _delta_time: f32) {
            self.updates += 1;
        }

        fn on_entity_signature_changed(&mut self, entity: &Entity) {
            self.tracked.observe(self.required, entity);
        }
    }

    impl<const N: u32> SystemKind for Tracker<N> {
        const ID: u32 = N;
    }

    /// Attaches `Mass` to its targets during its update.
    #[derive(Default)]
    struct Grower {
        targets: Vec<EntityId>,
    }

    impl System for Grower {
        fn signature(&self) -> Signature {
            Signature::EMPTY
        }

        fn update(&mut self, world: &mut World, _delta_time: f32) {
            for id in self.targets.drain(..) {
                world.attach(id, Mass(1.0)).unwrap();
            }
        }

        fn on_entity_signature_changed(&mut self, _entity: &Entity) {}
    }

    impl SystemKind for Grower {
        const ID: u32 = 100;
    }

    /// Creates one entity per update.
    #[derive(Default)]
    struct Spawner {
        spawned: Vec<EntityId>,
    }

    impl System for Spawner {
        fn signature(&self) -> Signature {
            Signature::EMPTY
        }

        fn update(&mut self, world: &mut World, _delta_time: f32) {
            self.spawned.push(world.create_entity().unwrap());
        }

        fn on_entity_signature_changed(&mut self, _entity: &Entity) {}
    }

    impl SystemKind for Spawner {
        const ID: u32 = 300;
    }

    /// Tries every structural mutation from inside its update.
    #[derive(Default)]
    struct Meddler {
        errors: Vec<EcsError>,
    }

    impl System for Meddler {
        fn signature(&self) -> Signature {
            Signature::EMPTY
        }

        fn update(&mut self, world: &mut World, delta_time: f32) {
            self.errors.extend(world.register_system(Grower::default()).err());
            self.errors.extend(world.deregister_system::<Tracker<1>>().err());
            self.errors.extend(world.compact().err());
            self.errors.extend(world.update_all(delta_time).err());
            self.errors.extend(world.step(delta_time).err());
            self.errors.extend(world.system::<Meddler>().err());
        }

        fn on_entity_signature_changed(&mut self, _entity: &Entity) {}
    }

    impl SystemKind for Meddler {
        const ID: u32 = 200;
    }

    fn small_world() -> World {
        World::new(WorldConfig {
            max_entities: 8,
            max_components_per_entity: 4,
            max_systems: 4,
        })
    }

    #[test]
    fn test_world_creation() {
        let world = small_world();
        assert_eq!(world.config().max_entities, 8);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.system_count(), 0);
        assert_eq!(world.step_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WorldConfig {
            max_entities: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(World::try_new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_attach_detach_roundtrip() {
        let mut world = small_world();
        let id = world.create_entity().unwrap();

        world.attach(id, Tag(7)).unwrap();
        assert!(world.has::<Tag>(id));
        assert!(world.entity(id).unwrap().has_component(Tag::ID));

        assert_eq!(world.detach::<Tag>(id).unwrap().0, 7);
        assert!(!world.has::<Tag>(id));
        assert!(world.entity(id).unwrap().signature().is_empty());
    }

    #[test]
    fn test_register_replays_live_entities() {
        let mut world = small_world();
        let tagged = world.create_entity().unwrap();
        world.attach(tagged, Tag(1)).unwrap();
        let bare = world.create_entity().unwrap();

        world
            .register_system(Tracker::<1>::new(Signature::of::<Tag>()))
            .unwrap();

        let tracker = world.system::<Tracker<1>>().unwrap();
        assert!(tracker.tracked.contains(tagged));
        assert!(!tracker.tracked.contains(bare));
    }

    #[test]
    fn test_empty_signature_tracks_bare_entities() {
        let mut world = small_world();
        let before = world.create_entity().unwrap();
        world
            .register_system(Tracker::<1>::new(Signature::EMPTY))
            .unwrap();
        let after = world.create_entity().unwrap();

        let tracker = world.system::<Tracker<1>>().unwrap();
        assert!(tracker.tracked.contains(before));
        assert!(tracker.tracked.contains(after));
    }

    #[test]
    fn test_creation_during_dispatch_is_delivered() {
        let mut world = small_world();
        world
            .register_system(Tracker::<1>::new(Signature::EMPTY))
            .unwrap();
        world.register_system(Spawner::default()).unwrap();

        world.step(0.0).unwrap();

        let spawned = world.system::<Spawner>().unwrap().spawned.clone();
        assert_eq!(spawned.len(), 1);
        assert!(world.system::<Tracker<1>>().unwrap().tracked.contains(spawned[0]));
    }

    #[test]
    fn test_step_compacts_then_updates() {
        let mut world = small_world();
        world
            .register_system(Tracker::<1>::new(Signature::EMPTY))
            .unwrap();

        let id = world.create_entity().unwrap();
        world.attach(id, Tag(3)).unwrap();
        assert_eq!(world.destroy_entity(id), Ok(true));

        assert!(!world.is_alive(id));
        assert_eq!(world.get::<Tag>(id).unwrap().0, 3);
        assert!(world.system::<Tracker<1>>().unwrap().tracked.contains(id));

        let stats = world.step(0.016).unwrap();
        assert_eq!(
            stats,
            StepStats {
                step: 1,
                reclaimed: 1,
                systems_updated: 1,
            }
        );
        assert!(world.get::<Tag>(id).is_err());
        assert!(world.system::<Tracker<1>>().unwrap().tracked.is_empty());
        assert_eq!(world.components().count::<Tag>(), 0);
    }

    #[test]
    fn test_changes_during_dispatch_reach_every_system() {
        let mut world = small_world();
        world
            .register_system(Tracker::<1>::new(Signature::of::<Tag>() | Signature::of::<Mass>()))
            .unwrap();

        let id = world.create_entity().unwrap();
        world.attach(id, Tag(0)).unwrap();
        world
            .register_system(Grower { targets: vec![id] })
            .unwrap();

        world.step(0.0).unwrap();

        // Tracker ran before Grower, yet still sees the change.
        let tracker = world.system::<Tracker<1>>().unwrap();
        assert!(tracker.tracked.contains(id));
        assert_eq!(tracker.updates, 1);
        assert!(world.has::<Mass>(id));
    }

    #[test]
    fn test_mutation_inside_update_is_rejected() {
        let mut world = small_world();
        world
            .register_system(Tracker::<1>::new(Signature::EMPTY))
            .unwrap();
        world.register_system(Meddler::default()).unwrap();

        world.step(0.0).unwrap();

        let meddler = world.system::<Meddler>().unwrap();
        assert_eq!(meddler.errors.len(), 6);
        assert!(meddler.errors[..5]
            .iter()
            .all(|error| matches!(error, EcsError::ReentrantMutation { .. })));
        assert!(meddler.errors[5].is_not_found());

        // Nothing structural happened.
        assert_eq!(world.system_count(), 2);
        assert!(world.system::<Grower>().is_err());
        assert!(!world.systems().is_dispatching());
    }

    #[test]
    fn test_deregister_then_step() {
        let mut world = small_world();
        world.register_system(Tracker::<1>::new(Signature::EMPTY)).unwrap();
        world.register_system(Tracker::<2>::new(Signature::EMPTY)).unwrap();

        assert_eq!(world.deregister_system::<Tracker<1>>(), Ok(true));
        assert_eq!(world.deregister_system::<Tracker<1>>(), Ok(false));

        let stats = world.step(0.0).unwrap();
        assert_eq!(stats.systems_updated, 1);
        assert_eq!(world.system::<Tracker<2>>().unwrap().updates, 1);
    }
}
