//! # Archetypes
//!
//! A precomputed composition and identity for bulk entity creation.
//!
//! Creating an entity from an archetype skips the edit pool entirely: the
//! entity starts with the archetype's identity, the component store fills in
//! payloads in one call, and the entity is marked changed for the next pass.

use super::component::ComponentType;
use super::composition::BitComposition;
use super::identity::CompositionId;

/// Fixed component set with its resolved composition identity.
///
/// Obtained from [`World::archetype`](super::World::archetype), which
/// resolves the identity through the same resolver entities use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archetype {
    types: Vec<ComponentType>,
    composition: BitComposition,
    identity: CompositionId,
}

impl Archetype {
    pub(crate) fn new(
        types: Vec<ComponentType>,
        composition: BitComposition,
        identity: CompositionId,
    ) -> Self {
        Self {
            types,
            composition,
            identity,
        }
    }

    /// Component types in the order they were given.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[ComponentType] {
        &self.types
    }

    /// Presence bits of the archetype.
    #[inline]
    #[must_use]
    pub fn composition(&self) -> &BitComposition {
        &self.composition
    }

    /// Identity every entity created from this archetype starts with.
    #[inline]
    #[must_use]
    pub const fn identity(&self) -> CompositionId {
        self.identity
    }
}
