//! # Entity Identifiers
//!
//! Entities are plain integer handles. IDs are recycled through a FIFO free
//! list once a deletion has been fully processed, so no two live entities
//! ever share an ID.

use std::collections::VecDeque;
use std::fmt;

use super::composition::BitComposition;

/// Unique identifier for a live entity.
///
/// IDs start at 0 and are reissued after retirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an entity ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the ID as a table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Inverse of [`EntityId::index`] for IDs read back from bitsets.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues entity IDs, reissuing retired ones first-in first-out.
#[derive(Debug, Default)]
pub struct RecyclingIdFactory {
    /// Retired IDs waiting to be reissued.
    limbo: VecDeque<u32>,
    /// Bit set for every ID currently in `limbo`.
    recycled: BitComposition,
    /// Next never-issued ID.
    next_id: u32,
}

impl RecyclingIdFactory {
    /// Creates a factory that has issued nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with room for `capacity` IDs before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            limbo: VecDeque::with_capacity(capacity.min(64)),
            recycled: BitComposition::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Takes the oldest retired ID, or allocates a fresh one.
    pub fn obtain(&mut self) -> EntityId {
        if let Some(id) = self.limbo.pop_front() {
            self.recycled.clear(id as usize);
            return EntityId(id);
        }

        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Makes a retired ID eligible for reissue.
    pub fn free(&mut self, id: EntityId) {
        self.limbo.push_back(id.0);
        self.recycled.set(id.index());
    }

    /// Returns `true` if the ID is waiting in the free list.
    #[inline]
    #[must_use]
    pub fn is_recycled(&self, id: EntityId) -> bool {
        self.recycled.get(id.index())
    }

    /// Returns `true` if the ID was ever handed out.
    #[inline]
    #[must_use]
    pub const fn was_issued(&self, id: EntityId) -> bool {
        id.0 < self.next_id
    }

    /// Number of IDs ever allocated, recycled or not.
    #[inline]
    #[must_use]
    pub const fn issued_count(&self) -> usize {
        self.next_id as usize
    }

    /// Number of IDs waiting to be reissued.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.limbo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_sequential() {
        let mut factory = RecyclingIdFactory::new();
        let ids: Vec<_> = (0..3).map(|_| factory.obtain().raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(factory.issued_count(), 3);
    }

    #[test]
    fn test_free_list_is_fifo() {
        let mut factory = RecyclingIdFactory::new();
        for _ in 0..4 {
            factory.obtain();
        }

        factory.free(EntityId::new(2));
        factory.free(EntityId::new(0));
        assert!(factory.is_recycled(EntityId::new(2)));

        assert_eq!(factory.obtain(), EntityId::new(2));
        assert_eq!(factory.obtain(), EntityId::new(0));
        assert!(!factory.is_recycled(EntityId::new(2)));
        assert_eq!(factory.obtain(), EntityId::new(4));
    }

    #[test]
    fn test_was_issued() {
        let mut factory = RecyclingIdFactory::new();
        let id = factory.obtain();
        assert!(factory.was_issued(id));
        assert!(!factory.was_issued(EntityId::new(1)));
    }
}
