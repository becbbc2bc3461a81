//! # Component Signatures
//!
//! A signature is a fixed-width bitset: bit `k` set means component kind `k`
//! is present. Systems declare a required signature and are interested in an
//! entity when `entity & required == required`.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use super::component::Component;

/// Index of a component kind. Doubles as its signature bit and slot index.
pub type ComponentKind = u8;

/// Number of distinct component kinds a signature can describe.
pub const SIGNATURE_BITS: usize = 64;

/// Bitset of component kinds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u64);

impl Signature {
    /// No kinds present.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns a copy with `kind` set.
    ///
    /// Kinds at or above [`SIGNATURE_BITS`] have no bit and are ignored.
    #[inline]
    #[must_use]
    pub const fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | bit(kind))
    }

    /// Signature holding exactly the kind of `C`.
    #[inline]
    #[must_use]
    pub const fn of<C: Component>() -> Self {
        Self::EMPTY.with(C::ID)
    }

    /// Sets `kind`.
    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= bit(kind);
    }

    /// Clears `kind`.
    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !bit(kind);
    }

    /// Checks whether `kind` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        let mask = bit(kind);
        mask != 0 && self.0 & mask == mask
    }

    /// Subset test: every kind in `required` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Checks whether no kind is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of kinds set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the set kinds, lowest first.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        let mut remaining = self.0;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let kind = remaining.trailing_zeros();
            remaining &= remaining - 1;
            #[allow(clippy::cast_possible_truncation)]
            Some(kind as ComponentKind)
        })
    }
}

#[inline]
const fn bit(kind: ComponentKind) -> u64 {
    match 1u64.checked_shl(kind as u32) {
        Some(mask) => mask,
        None => 0,
    }
}

impl BitOr for Signature {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Signature {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut sig = Signature::EMPTY;
        assert!(sig.is_empty());

        sig.insert(0);
        sig.insert(63);
        assert!(sig.contains(0));
        assert!(sig.contains(63));
        assert!(!sig.contains(1));
        assert_eq!(sig.len(), 2);

        sig.remove(0);
        assert!(!sig.contains(0));
        assert_eq!(sig.kinds().collect::<Vec<_>>(), vec![63]);
    }

    #[test]
    fn test_subset_check() {
        let entity = Signature::EMPTY.with(1).with(2).with(5);
        let movement = Signature::EMPTY.with(1).with(2);
        let render = Signature::EMPTY.with(1).with(3);

        assert!(entity.contains_all(movement));
        assert!(!entity.contains_all(render));
        assert!(entity.contains_all(Signature::EMPTY));
        assert_eq!(entity & render, Signature::EMPTY.with(1));
        assert_eq!(movement | render, Signature::EMPTY.with(1).with(2).with(3));
    }

    #[test]
    fn test_out_of_range_kind_has_no_bit() {
        let sig = Signature::EMPTY.with(64).with(200);
        assert!(sig.is_empty());
        assert!(!sig.contains(64));
    }

    #[test]
    fn test_debug_lists_kinds() {
        let sig = Signature::EMPTY.with(4).with(2);
        assert_eq!(format!("{sig:?}"), "{2, 4}");
    }
}
