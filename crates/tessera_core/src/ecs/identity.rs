//! # Composition Identities
//!
//! Every distinct composition ever observed gets a small integer identity.
//! Entities with the same components share one identity, so a subscription
//! only evaluates its aspect once per identity and then answers per-entity
//! questions with a bit lookup.
//!
//! Identities are never reassigned or dropped. Lookup is a linear scan, which
//! stays cheap because distinct compositions are bounded by the component
//! combinations an application actually uses, not by entity count.

use std::fmt;

use super::composition::BitComposition;

/// Deduplicating handle for a distinct composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CompositionId(u32);

impl CompositionId {
    /// Sentinel for an entity whose composition has not been resolved yet.
    pub const UNRESOLVED: Self = Self(0);

    /// Identity of the empty composition.
    pub const EMPTY: Self = Self(1);

    /// Wraps a raw identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Slot index of this identity.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for [`CompositionId::UNRESOLVED`].
    #[inline]
    #[must_use]
    pub const fn is_unresolved(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CompositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequence of known compositions indexed by identity.
///
/// Slot 0 is the unresolved sentinel and holds nothing; slot 1 is the empty
/// composition.
#[derive(Debug)]
pub struct CompositionIdentityResolver {
    compositions: Vec<Option<BitComposition>>,
}

impl Default for CompositionIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionIdentityResolver {
    /// Creates a resolver knowing only the empty composition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            compositions: vec![None, Some(BitComposition::new())],
        }
    }

    /// Identity for `composition`, assigning the next one on first sight.
    pub fn identity_for(&mut self, composition: &BitComposition) -> CompositionId {
        if let Some(found) = self
            .compositions
            .iter()
            .position(|known| known.as_ref() == Some(composition))
        {
            return Self::id_at(found);
        }

        let identity = Self::id_at(self.compositions.len());
        self.compositions.push(Some(composition.clone()));
        identity
    }

    /// Composition of a known identity.
    #[inline]
    #[must_use]
    pub fn composition(&self, identity: CompositionId) -> Option<&BitComposition> {
        self.compositions.get(identity.index())?.as_ref()
    }

    /// Highest identity assigned so far.
    #[inline]
    #[must_use]
    pub fn highest(&self) -> CompositionId {
        Self::id_at(self.compositions.len() - 1)
    }

    /// Number of distinct compositions known, including the empty one.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.compositions.len() - 1
    }

    /// Always `false`: the empty composition is known from the start.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over `(identity, composition)` pairs in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (CompositionId, &BitComposition)> + '_ {
        self.compositions
            .iter()
            .enumerate()
            .filter_map(|(slot, known)| known.as_ref().map(|bits| (Self::id_at(slot), bits)))
    }

    fn id_at(slot: usize) -> CompositionId {
        CompositionId(u32::try_from(slot).unwrap_or(u32::MAX))
    }
}
