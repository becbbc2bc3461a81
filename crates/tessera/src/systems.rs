//! # Demo Systems
//!
//! ```text
//! MovementSystem   Position + Velocity   position += velocity * dt
//! LifetimeSystem   Lifetime              count down, destroy at zero
//! ```

use tessera_core::{Entity, EntitySet, Signature, System, SystemKind, World};
use tracing::trace;

use crate::components::{Lifetime, Position, Velocity};

/// Integrates velocity into position.
#[derive(Debug, Default)]
pub struct MovementSystem {
    tracked: EntitySet,
}

impl MovementSystem {
    /// Entities currently moving.
    #[must_use]
    pub fn tracked(&self) -> &EntitySet {
        &self.tracked
    }
}

impl System for MovementSystem {
    fn signature(&self) -> Signature {
        Signature::of::<Position>() | Signature::of::<Velocity>()
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        for id in self.tracked.to_vec() {
            let Ok(&Velocity(velocity)) = world.get::<Velocity>(id) else {
                continue;
            };
            if let Ok(Position(position)) = world.get_mut::<Position>(id) {
                *position += velocity * delta_time;
            }
        }
    }

    fn on_entity_signature_changed(&mut self, entity: &Entity) {
        self.tracked.observe(self.signature(), entity);
    }

    fn name(&self) -> &'static str {
        "movement"
    }
}

impl SystemKind for MovementSystem {
    const ID: u32 = 1;
}

/// Counts lifetimes down and destroys entities whose time ran out.
#[derive(Debug, Default)]
pub struct LifetimeSystem {
    tracked: EntitySet,
    expired: u64,
}

impl LifetimeSystem {
    /// Entities destroyed by this system so far.
    #[must_use]
    pub const fn expired(&self) -> u64 {
        self.expired
    }
}

impl System for LifetimeSystem {
    fn signature(&self) -> Signature {
        Signature::of::<Lifetime>()
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        for id in self.tracked.to_vec() {
            // Already destroyed this step; still tracked until compaction.
            if !world.is_alive(id) {
                continue;
            }
            let Ok(Lifetime(remaining)) = world.get_mut::<Lifetime>(id) else {
                continue;
            };
            *remaining -= delta_time;
            if *remaining <= 0.0 && world.destroy_entity(id) == Ok(true) {
                trace!(entity = %id, "lifetime expired");
                self.expired += 1;
            }
        }
    }

    fn on_entity_signature_changed(&mut self, entity: &Entity) {
        self.tracked.observe(self.signature(), entity);
    }

    fn name(&self) -> &'static str {
        "lifetime"
    }
}

impl SystemKind for LifetimeSystem {
    const ID: u32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_shared::Vec2;

    #[test]
    fn test_movement_integrates_velocity() {
        let mut world = World::default();
        world.register_system(MovementSystem::default()).unwrap();

        let id = world.create_entity().unwrap();
        world.attach(id, Position(Vec2::ZERO)).unwrap();
        world.attach(id, Velocity(Vec2::new(1.0, 0.0))).unwrap();

        world.step(1.0).unwrap();
        assert_eq!(world.get::<Position>(id).unwrap().0, Vec2::new(1.0, 0.0));
        assert!(world.system::<MovementSystem>().unwrap().tracked().contains(id));
    }

    #[test]
    fn test_lifetime_expires_once() {
        let mut world = World::default();
        world.register_system(LifetimeSystem::default()).unwrap();

        let id = world.create_entity().unwrap();
        world.attach(id, Lifetime(1.0)).unwrap();

        world.step(0.5).unwrap();
        assert!(world.is_alive(id));

        world.step(0.5).unwrap();
        assert!(!world.is_alive(id));

        let stats = world.step(0.5).unwrap();
        assert_eq!(stats.reclaimed, 1);
        assert_eq!(world.system::<LifetimeSystem>().unwrap().expired(), 1);
    }
}
