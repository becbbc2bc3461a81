//! # Slot Arena
//!
//! Fixed-capacity storage with stable indices for objects that are frequently
//! created and destroyed.
//!
//! - A dense backing vector, grown on demand but never past the capacity
//! - A free list of reclaimed indices (most recently freed is reused first)
//! - A generation per slot, bumped on removal, so a stale id is detected
//!   instead of silently reaching the slot's next occupant

use super::entity::EntityId;

/// A slot in the arena.
#[derive(Debug)]
struct Slot<T> {
    /// Generation of the current (or next) occupant.
    generation: u32,
    /// The stored value, `None` when free.
    value: Option<T>,
}

/// A generational arena keyed by [`EntityId`].
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. It is owned by a single registry.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena: SlotArena<u32> = SlotArena::new(16);
///
/// let id = arena.insert_with(|_| 42).unwrap();
/// arena.remove(id);
///
/// // The slot comes back under a new generation.
/// let reused = arena.insert_with(|_| 7).unwrap();
/// assert_eq!(reused.index(), id.index());
/// assert!(arena.get(id).is_none());
/// ```
#[derive(Debug)]
pub struct SlotArena<T> {
    /// The storage array.
    slots: Vec<Slot<T>>,
    /// Free list - indices of reclaimed slots.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    len: usize,
    /// Total capacity.
    capacity: usize,
}

impl<T> SlotArena<T> {
    /// Creates a new arena with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            capacity,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when every slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Claims a slot and stores the value built from the slot's new id.
    ///
    /// Reclaimed indices are reused before the arena grows.
    ///
    /// # Returns
    ///
    /// The id of the occupied slot, or None if the arena is full.
    pub fn insert_with<F>(&mut self, make: F) -> Option<EntityId>
    where
        F: FnOnce(EntityId) -> T,
    {
        if self.is_full() {
            return None;
        }

        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len()).ok()?;
                self.slots.push(Slot { generation: 0, value: None });
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = EntityId::new(index, slot.generation);
        slot.value = Some(make(id));
        self.len += 1;

        Some(id)
    }

    /// Frees an occupied slot.
    ///
    /// # Returns
    ///
    /// The removed value, or None if the id was stale or never issued.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take()?;

        // Invalidate every outstanding copy of `id`.
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index());
        self.len -= 1;

        Some(value)
    }

    /// Checks whether `id` names an occupied slot.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Gets a reference to the value stored under `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Gets a mutable reference to the value stored under `id`.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.slot_mut(id)?.value.as_mut()
    }

    /// Iterates over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let index = u32::try_from(index).ok()?;
            slot.value
                .as_ref()
                .map(|value| (EntityId::new(index, slot.generation), value))
        })
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Slot<T>> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        (slot.generation == id.generation()).then_some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_insert_remove() {
        let mut arena: SlotArena<u32> = SlotArena::new(10);

        let id = arena.insert_with(|_| 42).unwrap();
        assert_eq!(*arena.get(id).unwrap(), 42);
        assert_eq!(arena.len(), 1);

        assert_eq!(arena.remove(id), Some(42));
        assert!(arena.is_empty());
        assert_eq!(arena.remove(id), None);
    }

    #[test]
    fn test_arena_full() {
        let mut arena: SlotArena<u8> = SlotArena::new(2);

        assert!(arena.insert_with(|_| 1).is_some());
        assert!(arena.insert_with(|_| 2).is_some());
        assert!(arena.is_full());
        assert!(arena.insert_with(|_| 3).is_none());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_arena_reuse_bumps_generation() {
        let mut arena: SlotArena<u32> = SlotArena::new(1);

        let h1 = arena.insert_with(|_| 1).unwrap();
        arena.remove(h1);

        let h2 = arena.insert_with(|_| 2).unwrap();
        assert_eq!(h1.index(), h2.index()); // Same slot reused
        assert_ne!(h1.generation(), h2.generation());
        assert!(arena.get(h1).is_none());
        assert_eq!(*arena.get(h2).unwrap(), 2);
    }

    #[test]
    fn test_value_sees_its_own_id() {
        let mut arena: SlotArena<EntityId> = SlotArena::new(4);
        let id = arena.insert_with(|id| id).unwrap();
        assert_eq!(*arena.get(id).unwrap(), id);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena: SlotArena<char> = SlotArena::new(4);
        let a = arena.insert_with(|_| 'a').unwrap();
        let b = arena.insert_with(|_| 'b').unwrap();
        let c = arena.insert_with(|_| 'c').unwrap();
        arena.remove(b);

        let seen: Vec<_> = arena.iter().map(|(id, v)| (id, *v)).collect();
        assert_eq!(seen, vec![(a, 'a'), (c, 'c')]);
    }
}
