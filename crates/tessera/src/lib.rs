//! # TESSERA
//!
//! A small simulation built on the runtime:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Simulation                                               │
//! │  ├─ DeltaSource ──── delta_time ───┐                     │
//! │  ├─ DefinitionParser ── spawn ──┐  │                     │
//! │  └─ World <─────────────────────┴──┘                     │
//! │       ├─ MovementSystem   (Position + Velocity)          │
//! │       └─ LifetimeSystem   (Lifetime)                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `components`: Demo component types and their kind indices
//! - `systems`: Demo systems
//! - `sim`: The driver and its configuration file

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod components;
pub mod sim;
pub mod systems;

pub use tessera_core as core;

pub use components::{Lifetime, Position, Velocity};
pub use sim::{RunConfig, RunSummary, SimError, Simulation, SimulationConfig};
pub use systems::{LifetimeSystem, MovementSystem};
