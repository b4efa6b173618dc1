//! Module sets ("domains") as fixed-width bitsets over catalog IDs.
//!
//! Every set built for one catalog has the same bit width, so union and
//! intersection are plain word-wise operations on the backing storage.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable catalog index of a module, assigned at catalog load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u16);

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A set of modules from one catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct ModuleSet {
    bits: BitVec<u64, Lsb0>,
}

impl ModuleSet {
    /// Empty set able to hold `capacity` modules.
    pub fn empty(capacity: usize) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 0; capacity],
        }
    }

    /// Set containing every module ID below `capacity`.
    pub fn full(capacity: usize) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 1; capacity],
        }
    }

    pub fn single(capacity: usize, id: ModuleId) -> Self {
        let mut set = Self::empty(capacity);
        set.insert(id);
        set
    }

    pub fn from_ids(capacity: usize, ids: impl IntoIterator<Item = ModuleId>) -> Self {
        let mut set = Self::empty(capacity);
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Number of IDs this set can hold (the catalog size).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.bits.get(id.index()).map(|b| *b).unwrap_or(false)
    }

    /// Insert `id`; IDs outside the capacity are ignored.
    pub fn insert(&mut self, id: ModuleId) {
        if id.index() < self.bits.len() {
            self.bits.set(id.index(), true);
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Lowest member ID.
    pub fn first(&self) -> Option<ModuleId> {
        self.bits.first_one().map(|i| ModuleId(i as u16))
    }

    /// Members in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.bits.iter_ones().map(|i| ModuleId(i as u16))
    }

    /// `self |= other`.
    pub fn union_with(&mut self, other: &ModuleSet) {
        debug_assert_eq!(self.capacity(), other.capacity());
        for (a, b) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *a |= *b;
        }
    }

    /// `self &= other`. Returns true if any member was removed.
    pub fn intersect_with(&mut self, other: &ModuleSet) -> bool {
        debug_assert_eq!(self.capacity(), other.capacity());
        let before = self.len();
        for (a, b) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *a &= *b;
        }
        self.len() < before
    }

    /// Replace the contents with exactly `id`.
    pub fn set_single(&mut self, id: ModuleId) {
        self.clear();
        self.insert(id);
    }
}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.0)).finish()
    }
}
