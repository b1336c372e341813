//! # ECS World
//!
//! The central container: owns the component registry, the entity
//! lifecycle, the edit pool and every subscription, and runs the
//! synchronization loop that ties them together.
//!
//! ## Frame Flow
//!
//! ```text
//! create / edit / delete ──► edit pool (deferred)
//!                               │  synchronize()
//!                               ▼
//!                  identities recomputed, new ones broadcast
//!                               ▼
//!              subscriptions: deletions, changes, listeners
//!                               ▼
//!            deleted IDs retired, deferred commands applied
//!                               ▼
//!                 repeat until nothing is pending
//! ```

use super::archetype::Archetype;
use super::aspect::AspectBuilder;
use super::component::{ComponentStore, ComponentType, ComponentTypeRegistry};
use super::composition::BitComposition;
use super::edit::{EntityEdit, EntityEditPool};
use super::entity::EntityId;
use super::identity::CompositionId;
use super::lifecycle::EntityLifecycle;
use super::subscription::{
    DeferredCommand, DeferredCommands, Subscription, SubscriptionId, SubscriptionListener,
    SubscriptionManager,
};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS world.
///
/// Structural changes requested between passes are batched; nothing a
/// subscription reports changes until [`World::synchronize`] runs.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let health = world.registry_mut().register::<Health>();
/// let living = world.subscribe(&AspectBuilder::new().require([health]))?;
///
/// let e = world.create();
/// world.edit(e)?.add(health);
/// world.synchronize()?;
/// assert!(world.subscription(living)?.contains(e));
/// ```
#[derive(Debug)]
pub struct World {
    registry: ComponentTypeRegistry,
    lifecycle: EntityLifecycle,
    edit_pool: EntityEditPool,
    subscriptions: SubscriptionManager,
    /// Entities whose identity changed since the last round.
    changed: BitComposition,
    /// Entities deleted since the last round.
    deleted: BitComposition,
    /// Commands queued by listeners during the current round.
    commands: DeferredCommands,
    all_entities: SubscriptionId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world sized from `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let mut registry = ComponentTypeRegistry::new();
        let lifecycle = EntityLifecycle::new(&config);
        let mut subscriptions = SubscriptionManager::new();
        let all_entities =
            subscriptions.get_or_create(&AspectBuilder::all(), &mut registry, &lifecycle);

        Self {
            registry,
            lifecycle,
            edit_pool: EntityEditPool::new(config.edit_pool_capacity),
            subscriptions,
            changed: BitComposition::with_capacity(config.expected_entity_count),
            deleted: BitComposition::with_capacity(config.expected_entity_count),
            commands: DeferredCommands::default(),
            all_entities,
        }
    }

    /// Component type registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ComponentTypeRegistry {
        &self.registry
    }

    /// Mutable component type registry, for registering kinds.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut ComponentTypeRegistry {
        &mut self.registry
    }

    /// Entity lifecycle, for read-only queries.
    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> &EntityLifecycle {
        &self.lifecycle
    }

    /// Edit pool, for read-only queries.
    #[inline]
    #[must_use]
    pub fn edit_pool(&self) -> &EntityEditPool {
        &self.edit_pool
    }

    /// Creates an entity and opens an edit for it.
    ///
    /// The entity is reported as changed at the next pass even if no
    /// component is added.
    pub fn create(&mut self) -> EntityId {
        let entity = self.lifecycle.create();
        self.edit_pool.open_fresh(entity);
        entity
    }

    /// Precomputes an archetype for a fixed set of component types.
    ///
    /// The identity is resolved (and broadcast if new) right away, so
    /// entities created from it need no scan.
    pub fn archetype(&mut self, types: &[ComponentType]) -> Archetype {
        let composition: BitComposition = types.iter().map(|ty| ty.index()).collect();
        let identity = self
            .lifecycle
            .resolve_identity(&composition, &mut self.subscriptions);
        Archetype::new(types.to_vec(), composition, identity)
    }

    /// Creates an entity from an archetype, bypassing the edit pool.
    ///
    /// `store` is asked to populate every component of the archetype.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ForeignArchetype`] if the archetype was built by
    /// another world; no ID is issued in that case.
    pub fn create_from_archetype<S: ComponentStore>(
        &mut self,
        archetype: &Archetype,
        store: &mut S,
    ) -> EcsResult<EntityId> {
        let identity = archetype.identity();
        if self.lifecycle.composition_for(identity) != Some(archetype.composition()) {
            return Err(EcsError::ForeignArchetype(identity));
        }

        let entity = self.lifecycle.create_with_identity(identity);
        store.bulk_add(entity, archetype);
        self.changed.set(entity.index());
        Ok(entity)
    }

    /// Open edit for an entity; repeated calls return the same edit.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InactiveEntity`] if the entity is not live.
    pub fn edit(&mut self, entity: EntityId) -> EcsResult<&mut EntityEdit> {
        self.edit_pool.obtain_editor(entity, &self.lifecycle)
    }

    /// Schedules an entity for deletion at the next pass.
    ///
    /// The ID stays active, and is not reissued, until that pass retires it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InactiveEntity`] if the entity is not live.
    pub fn delete(&mut self, entity: EntityId) -> EcsResult<()> {
        if !self.lifecycle.is_active(entity) {
            return Err(EcsError::InactiveEntity(entity));
        }

        // An archetype entity deleted before its first pass is never inserted
        self.changed.clear(entity.index());
        self.edit_pool
            .delete(entity, &mut self.lifecycle, &mut self.subscriptions)
    }

    /// Returns `true` if the entity is live, synchronized or not.
    #[inline]
    #[must_use]
    pub fn is_active(&self, entity: EntityId) -> bool {
        self.lifecycle.is_active(entity)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.lifecycle.active_count()
    }

    /// Composition identity of an entity, resolving it if needed.
    ///
    /// An entity created since the last pass has no identity yet; asking for
    /// it applies the entity's open edit immediately. The edit stays open and
    /// is still processed at the next pass.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InactiveEntity`] if the entity is not live.
    pub fn composition_identity(&mut self, entity: EntityId) -> EcsResult<CompositionId> {
        if !self.lifecycle.is_active(entity) {
            return Err(EcsError::InactiveEntity(entity));
        }

        let identity = self.lifecycle.identity(entity);
        if identity.is_unresolved() {
            return self.force_resolve(entity);
        }
        Ok(identity)
    }

    /// Current composition of an entity, resolving it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InactiveEntity`] if the entity is not live.
    pub fn composition(&mut self, entity: EntityId) -> EcsResult<&BitComposition> {
        let identity = self.composition_identity(entity)?;
        self.lifecycle
            .composition_for(identity)
            .ok_or(EcsError::InactiveEntity(entity))
    }

    /// Subscription for `builder`, created and synchronized on first use.
    ///
    /// Entities created since the last pass are resolved first, so the new
    /// subscription already reflects them.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEditResolution`] if pool bookkeeping is corrupt.
    pub fn subscribe(&mut self, builder: &AspectBuilder) -> EcsResult<SubscriptionId> {
        if let Some(id) = self.subscriptions.get(builder) {
            return Ok(id);
        }

        let unresolved: Vec<EntityId> = self
            .lifecycle
            .active_entities()
            .filter(|&entity| self.lifecycle.identity(entity).is_unresolved())
            .collect();
        for entity in unresolved {
            self.force_resolve(entity)?;
        }

        Ok(self
            .subscriptions
            .get_or_create(builder, &mut self.registry, &self.lifecycle))
    }

    /// Subscription by handle.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSubscription`] if `id` was issued by another world.
    pub fn subscription(&self, id: SubscriptionId) -> EcsResult<&Subscription> {
        self.subscriptions
            .subscription(id)
            .ok_or(EcsError::UnknownSubscription(id.index()))
    }

    /// Registers a listener on a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownSubscription`] if `id` was issued by another world.
    pub fn add_listener(
        &mut self,
        id: SubscriptionId,
        listener: impl SubscriptionListener + 'static,
    ) -> EcsResult<()> {
        self.subscriptions
            .subscription_mut(id)
            .ok_or(EcsError::UnknownSubscription(id.index()))?
            .add_listener(Box::new(listener));
        Ok(())
    }

    /// The catch-all subscription matching every entity.
    ///
    /// Its listeners learn about world-level activation and deactivation.
    #[inline]
    #[must_use]
    pub const fn all_entities(&self) -> SubscriptionId {
        self.all_entities
    }

    /// Subscription manager, for read-only queries.
    #[inline]
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// Drains every pending edit and deletion, notifying subscriptions.
    ///
    /// Runs rounds until nothing is pending: edits queued by listeners are
    /// applied in the next round. Returns the number of rounds run.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEditResolution`] if pool bookkeeping is
    /// corrupt while applying deferred commands.
    pub fn synchronize(&mut self) -> EcsResult<usize> {
        let mut rounds = 0;

        loop {
            let processed = self.edit_pool.process_entities(
                &mut self.lifecycle,
                &mut self.subscriptions,
                &mut self.changed,
                &mut self.deleted,
            );
            if !processed && self.changed.is_empty() {
                break;
            }
            rounds += 1;

            self.subscriptions.process(
                &mut self.changed,
                &mut self.deleted,
                &self.lifecycle,
                &mut self.commands,
            );
            tracing::debug!(
                round = rounds,
                changed = self.subscriptions.changed_ids().len(),
                deleted = self.subscriptions.deleted_ids().len(),
                "synchronization round"
            );

            self.lifecycle.retire(self.subscriptions.deleted_ids());
            self.apply_deferred_commands()?;
        }

        Ok(rounds)
    }

    fn force_resolve(&mut self, entity: EntityId) -> EcsResult<CompositionId> {
        let edit = self.edit_pool.obtain_editor(entity, &self.lifecycle)?;
        Ok(self.lifecycle.apply_edit(edit, &mut self.subscriptions))
    }

    fn apply_deferred_commands(&mut self) -> EcsResult<()> {
        let mut commands = std::mem::take(&mut self.commands);

        for command in commands.drain() {
            let entity = match command {
                DeferredCommand::AddComponent { entity, .. }
                | DeferredCommand::RemoveComponent { entity, .. }
                | DeferredCommand::Delete(entity) => entity,
            };
            if !self.lifecycle.is_active(entity) {
                tracing::warn!(%entity, ?command, "dropping deferred command for retired entity");
                continue;
            }

            match command {
                DeferredCommand::AddComponent { entity, ty } => {
                    self.edit(entity)?.add(ty);
                }
                DeferredCommand::RemoveComponent { entity, ty } => {
                    self.edit(entity)?.remove(ty);
                }
                DeferredCommand::Delete(entity) => self.delete(entity)?,
            }
        }

        self.commands = commands;
        Ok(())
    }
}
