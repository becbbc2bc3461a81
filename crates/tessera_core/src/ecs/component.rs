//! # Component System
//!
//! Components are pure data containers with no behavior. The runtime defines
//! none of its own; games declare them and pick a kind index for each.

use super::signature::ComponentKind;

/// Marker trait for ECS components.
///
/// # Example
///
/// ```rust
/// use tessera_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     const ID: u8 = 4;
/// }
/// ```
pub trait Component: 'static {
    /// Unique kind index for this component type (0-63).
    ///
    /// Used as the signature bit and as the slot index in the entity's
    /// component slot array, so it must also be below the world's
    /// `max_components_per_entity`.
    const ID: ComponentKind;
}
