//! # Entity Lifecycle
//!
//! Owns the entity → composition identity table, the identity resolver and
//! the ID factory.
//!
//! The lifecycle remembers the highest identity it has already broadcast.
//! Any identity above that mark is new and is pushed to every subscription
//! exactly once, which keeps the broadcast cost proportional to distinct
//! compositions instead of entities.

use super::composition::BitComposition;
use super::edit::EntityEdit;
use super::entity::{EntityId, RecyclingIdFactory};
use super::identity::{CompositionId, CompositionIdentityResolver};
use super::subscription::{DeferredCommands, Subscription, SubscriptionManager};
use crate::config::WorldConfig;

/// Entity table, composition identities and ID recycling.
#[derive(Debug)]
pub struct EntityLifecycle {
    /// Identity per entity ID; `UNRESOLVED` until the first resolution.
    entity_to_identity: Vec<CompositionId>,
    resolver: CompositionIdentityResolver,
    /// Highest identity already pushed to the subscription manager.
    ///
    /// Starts at `EMPTY`: new subscriptions pick up the empty composition
    /// when they synchronize, so it never needs a broadcast.
    highest_seen: CompositionId,
    recycler: RecyclingIdFactory,
    identity_warning_threshold: usize,
    warned: bool,
}

impl EntityLifecycle {
    /// Creates an empty lifecycle sized from `config`.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            entity_to_identity: Vec::with_capacity(config.expected_entity_count),
            resolver: CompositionIdentityResolver::new(),
            // The empty composition is known from the start
            highest_seen: CompositionId::EMPTY,
            recycler: RecyclingIdFactory::with_capacity(config.expected_entity_count),
            identity_warning_threshold: config.identity_warning_threshold,
            warned: false,
        }
    }

    /// Issues an ID with an unresolved composition.
    pub fn create(&mut self) -> EntityId {
        self.create_with_identity(CompositionId::UNRESOLVED)
    }

    /// Issues an ID that starts at a precomputed identity.
    pub fn create_with_identity(&mut self, identity: CompositionId) -> EntityId {
        let entity = self.recycler.obtain();
        self.set_identity(entity, identity);
        entity
    }

    /// Current identity of an entity, `UNRESOLVED` if never resolved.
    #[inline]
    #[must_use]
    pub fn identity(&self, entity: EntityId) -> CompositionId {
        self.entity_to_identity
            .get(entity.index())
            .copied()
            .unwrap_or(CompositionId::UNRESOLVED)
    }

    /// Composition of the entity's last resolved identity.
    #[inline]
    #[must_use]
    pub fn resolved_composition(&self, entity: EntityId) -> Option<&BitComposition> {
        self.resolver.composition(self.identity(entity))
    }

    /// Composition stored for an identity.
    #[inline]
    #[must_use]
    pub fn composition_for(&self, identity: CompositionId) -> Option<&BitComposition> {
        self.resolver.composition(identity)
    }

    /// Resolves a composition, broadcasting it if it was never seen before.
    pub fn resolve_identity(
        &mut self,
        composition: &BitComposition,
        subscriptions: &mut SubscriptionManager,
    ) -> CompositionId {
        let identity = self.resolver.identity_for(composition);
        if identity > self.highest_seen {
            if let Some(bits) = self.resolver.composition(identity) {
                tracing::trace!(%identity, components = ?bits, "new composition identity");
                subscriptions.process_component_identity(identity, bits);
            }
            self.highest_seen = identity;
            self.check_identity_count();
        }
        identity
    }

    /// Recomputes the entity's identity from an edit's pending composition.
    pub fn apply_edit(
        &mut self,
        edit: &EntityEdit,
        subscriptions: &mut SubscriptionManager,
    ) -> CompositionId {
        let identity = self.resolve_identity(edit.composition(), subscriptions);
        self.set_identity(edit.entity(), identity);
        identity
    }

    /// Makes deleted IDs eligible for reissue.
    ///
    /// Only called once the deletion went through a synchronization pass.
    /// IDs already in the free list are skipped. Returns how many were freed.
    pub fn retire(&mut self, entities: &[EntityId]) -> usize {
        let mut freed = 0;
        for &entity in entities {
            if self.recycler.was_issued(entity) && !self.recycler.is_recycled(entity) {
                self.recycler.free(entity);
                freed += 1;
            }
        }
        freed
    }

    /// Returns `true` if the ID is issued and not waiting for reissue.
    ///
    /// Entities pending deletion stay active until they are retired.
    #[inline]
    #[must_use]
    pub fn is_active(&self, entity: EntityId) -> bool {
        self.recycler.was_issued(entity) && !self.recycler.is_recycled(entity)
    }

    /// Iterates over active IDs in ascending order.
    pub fn active_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.recycler.issued_count())
            .map(EntityId::from_index)
            .filter(|&entity| self.is_active(entity))
    }

    /// Number of active entities.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.recycler.issued_count() - self.recycler.free_count()
    }

    /// Highest identity broadcast so far.
    #[inline]
    #[must_use]
    pub const fn highest_seen_identity(&self) -> CompositionId {
        self.highest_seen
    }

    /// Number of distinct compositions known.
    #[inline]
    #[must_use]
    pub fn distinct_compositions(&self) -> usize {
        self.resolver.len()
    }

    /// Brings a new subscription up to date with everything already known.
    ///
    /// Feeds it every broadcast identity, then checks every active entity,
    /// then rebuilds its active list.
    pub fn synchronize(&self, subscription: &mut Subscription, commands: &mut DeferredCommands) {
        for (identity, bits) in self.resolver.iter() {
            if identity > self.highest_seen {
                break;
            }
            subscription.process_component_identity(identity, bits);
        }

        for entity in self.active_entities() {
            subscription.check(entity, self.identity(entity));
        }

        subscription.inform_entity_changes(commands);
        subscription.rebuild_compressed_actives();
    }

    fn set_identity(&mut self, entity: EntityId, identity: CompositionId) {
        let index = entity.index();
        if index >= self.entity_to_identity.len() {
            self.entity_to_identity
                .resize(index + 1, CompositionId::UNRESOLVED);
        }
        self.entity_to_identity[index] = identity;
    }

    fn check_identity_count(&mut self) {
        let count = self.resolver.len();
        if !self.warned && count > self.identity_warning_threshold {
            self.warned = true;
            tracing::warn!(
                count,
                threshold = self.identity_warning_threshold,
                "distinct composition count is high, identity lookup is a linear scan"
            );
        }
    }
}
