//! # TESSERA Shared
//!
//! Plain value types and frame timing used by simulations built on
//! `tessera_core`.
//!
//! ## CRITICAL RULE
//!
//! The ECS runtime must NEVER depend on this crate. Vectors are component
//! payloads and the timer only produces the `delta_time` passed to a step;
//! both are supplied by the user of the runtime.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;
pub mod time;

pub use math::Vec2;
pub use time::{DeltaSource, FixedStep, FrameClock};
