//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the entity slot arena (and every component column)
//! - A generation counter for safe reuse

use std::fmt;

use super::signature::{ComponentKind, Signature};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index
/// - Upper 32 bits: Generation counter for detecting stale references
///
/// A slot is reused after its entity is compacted away, but always under a new
/// generation, so no two live entities ever compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Entity record owned by the entity registry.
///
/// Slot `k` of the entity's component slot array is occupied exactly when bit
/// `k` of its signature is set; the component itself lives in the component
/// store at `(k, id.index())`. The record never owns component memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    signature: Signature,
    component_count: usize,
    marked_for_cleanup: bool,
}

impl Entity {
    /// Creates a fresh record with no components.
    #[inline]
    #[must_use]
    pub(crate) const fn new(id: EntityId) -> Self {
        Self {
            id,
            signature: Signature::EMPTY,
            component_count: 0,
            marked_for_cleanup: false,
        }
    }

    /// The entity's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Which component kinds are present.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> Signature {
        self.signature
    }

    /// Number of attached components.
    #[inline]
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.component_count
    }

    /// Checks if this entity has a specific component kind.
    #[inline]
    #[must_use]
    pub const fn has_component(&self, kind: ComponentKind) -> bool {
        self.signature.contains(kind)
    }

    /// Occupied slot indices, lowest first.
    pub fn component_kinds(&self) -> impl Iterator<Item = ComponentKind> {
        self.signature.kinds()
    }

    /// Whether a system requiring `required` is interested in this entity.
    ///
    /// Entities awaiting cleanup never match.
    #[inline]
    #[must_use]
    pub const fn matches(&self, required: Signature) -> bool {
        !self.marked_for_cleanup && self.signature.contains_all(required)
    }

    /// Whether the entity has been destroyed and awaits compaction.
    #[inline]
    #[must_use]
    pub const fn is_marked_for_cleanup(&self) -> bool {
        self.marked_for_cleanup
    }

    #[inline]
    pub(crate) fn add_component(&mut self, kind: ComponentKind) {
        self.signature.insert(kind);
        self.component_count += 1;
    }

    #[inline]
    pub(crate) fn remove_component(&mut self, kind: ComponentKind) {
        self.signature.remove(kind);
        self.component_count -= 1;
    }

    #[inline]
    pub(crate) fn mark_for_cleanup(&mut self) {
        self.marked_for_cleanup = true;
    }

    /// Drops every slot link. Called once the store has released the data.
    #[inline]
    pub(crate) fn clear_components(&mut self) {
        self.signature = Signature::EMPTY;
        self.component_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert!(!id.is_null());
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::new(7, 2).to_string(), "7v2");
        assert_eq!(EntityId::NULL.to_string(), "null");
    }

    #[test]
    fn test_entity_component_mask() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(!entity.has_component(5));

        entity.add_component(5);
        entity.add_component(9);
        assert!(entity.has_component(5));
        assert_eq!(entity.component_count(), 2);
        assert_eq!(entity.component_kinds().collect::<Vec<_>>(), vec![5, 9]);

        entity.remove_component(5);
        assert!(!entity.has_component(5));
        assert_eq!(entity.component_count(), 1);
    }

    #[test]
    fn test_marked_entity_never_matches() {
        let mut entity = Entity::new(EntityId::new(1, 0));
        entity.add_component(0);
        assert!(entity.matches(Signature::EMPTY.with(0)));
        assert!(entity.matches(Signature::EMPTY));

        entity.mark_for_cleanup();
        assert!(!entity.matches(Signature::EMPTY.with(0)));
        assert!(!entity.matches(Signature::EMPTY));
    }
}
