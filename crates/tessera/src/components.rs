//! # Demo Components
//!
//! Kind indices are fixed here once for the whole simulation.

use serde::Deserialize;
use tessera_core::Component;
use tessera_shared::Vec2;

/// Where an entity is, in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Position(pub Vec2);

impl Component for Position {
    const ID: u8 = 0;
}

/// How fast an entity moves, in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Velocity(pub Vec2);

impl Component for Velocity {
    const ID: u8 = 1;
}

/// Seconds left before the entity is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Lifetime(pub f32);

impl Component for Lifetime {
    const ID: u8 = 2;
}
