//! # Entity Subscriptions
//!
//! A subscription keeps the live set of entities matching one aspect and
//! tells its listeners when entities enter or leave that set.
//!
//! ## Per-Pass Protocol
//!
//! ```text
//! changed / deleted bitsets ──► ID lists (once, shared)
//!                                 │
//!        ┌────────────────────────┼────────────────────────┐
//!        ▼                        ▼                        ▼
//!  subscription 0           subscription 1            subscription N
//!  deletions, then changes (interest = cache[identity(e)])
//!  listeners: removed(..) then inserted(..)
//! ```
//!
//! Aspect evaluation happens only in
//! [`Subscription::process_component_identity`], once per identity. Every
//! per-entity check afterwards is a bit lookup.

use std::collections::HashMap;
use std::fmt;

use super::aspect::{Aspect, AspectBuilder};
use super::component::{ComponentType, ComponentTypeRegistry};
use super::composition::BitComposition;
use super::entity::EntityId;
use super::identity::CompositionId;
use super::lifecycle::EntityLifecycle;

/// Receives entity set changes of a subscription.
///
/// Called synchronously during a synchronization pass, in registration
/// order. The world is busy at that point; structural changes go through
/// `commands` and are applied in the following round of the same pass.
pub trait SubscriptionListener: Send {
    /// Entities that started matching.
    fn inserted(&mut self, entities: &[EntityId], commands: &mut DeferredCommands);

    /// Entities that stopped matching or were deleted.
    fn removed(&mut self, entities: &[EntityId], commands: &mut DeferredCommands);
}

/// Structural change requested from inside a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredCommand {
    /// Mark a component present.
    AddComponent {
        /// Target entity.
        entity: EntityId,
        /// Component to add.
        ty: ComponentType,
    },
    /// Mark a component absent.
    RemoveComponent {
        /// Target entity.
        entity: EntityId,
        /// Component to remove.
        ty: ComponentType,
    },
    /// Delete the entity.
    Delete(EntityId),
}

/// Queue of structural changes deferred past the current round.
#[derive(Debug, Default)]
pub struct DeferredCommands {
    queue: Vec<DeferredCommand>,
}

impl DeferredCommands {
    /// Queues a component addition.
    pub fn add_component(&mut self, entity: EntityId, ty: ComponentType) {
        self.queue.push(DeferredCommand::AddComponent { entity, ty });
    }

    /// Queues a component removal.
    pub fn remove_component(&mut self, entity: EntityId, ty: ComponentType) {
        self.queue.push(DeferredCommand::RemoveComponent { entity, ty });
    }

    /// Queues a deletion.
    pub fn delete(&mut self, entity: EntityId) {
        self.queue.push(DeferredCommand::Delete(entity));
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, DeferredCommand> {
        self.queue.drain(..)
    }
}

/// Handle to a subscription within its world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

impl SubscriptionId {
    /// Position in registration order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Live set of entities matching one aspect.
pub struct Subscription {
    builder: AspectBuilder,
    aspect: Aspect,
    /// Interest per composition identity. Never invalidated once set.
    interest_cache: BitComposition,
    active_entity_ids: BitComposition,
    /// `active_entity_ids` as an ascending list.
    entities: Vec<EntityId>,
    listeners: Vec<Box<dyn SubscriptionListener>>,
    inserted_ids: BitComposition,
    removed_ids: BitComposition,
    inserted: Vec<EntityId>,
    removed: Vec<EntityId>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("builder", &self.builder)
            .field("entities", &self.entities)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Creates an empty subscription.
    #[must_use]
    pub fn new(builder: AspectBuilder, aspect: Aspect) -> Self {
        Self {
            builder,
            aspect,
            interest_cache: BitComposition::new(),
            active_entity_ids: BitComposition::new(),
            entities: Vec::new(),
            listeners: Vec::new(),
            inserted_ids: BitComposition::new(),
            removed_ids: BitComposition::new(),
            inserted: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Compiled aspect.
    #[must_use]
    pub fn aspect(&self) -> &Aspect {
        &self.aspect
    }

    /// Builder this subscription is keyed by.
    #[must_use]
    pub fn builder(&self) -> &AspectBuilder {
        &self.builder
    }

    /// Active entities in ascending ID order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Active entities as a bitset.
    #[must_use]
    pub fn active_entity_ids(&self) -> &BitComposition {
        &self.active_entity_ids
    }

    /// Returns `true` if the entity is in the active set.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.active_entity_ids.get(entity.index())
    }

    /// Cached interest for a composition identity.
    #[inline]
    #[must_use]
    pub fn is_interested_in(&self, identity: CompositionId) -> bool {
        self.interest_cache.get(identity.index())
    }

    /// Registers a listener. Listeners are called in registration order.
    ///
    /// A new listener is not told about entities already active.
    pub fn add_listener(&mut self, listener: Box<dyn SubscriptionListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Evaluates the aspect for a newly discovered identity.
    pub fn process_component_identity(&mut self, identity: CompositionId, composition: &BitComposition) {
        self.interest_cache
            .set_to(identity.index(), self.aspect.is_interested(composition));
    }

    /// Updates membership of one entity from its current identity.
    pub fn check(&mut self, entity: EntityId, identity: CompositionId) {
        let interested = self.is_interested_in(identity);
        let contains = self.contains(entity);

        if interested && !contains {
            self.insert(entity);
        } else if !interested && contains {
            self.remove(entity);
        }
    }

    /// Applies one round of deletions and changes, then notifies listeners.
    pub fn process(
        &mut self,
        changed: &[EntityId],
        deleted: &[EntityId],
        lifecycle: &EntityLifecycle,
        commands: &mut DeferredCommands,
    ) {
        for &entity in deleted {
            if self.contains(entity) {
                self.remove(entity);
            }
        }

        for &entity in changed {
            self.check(entity, lifecycle.identity(entity));
        }

        if self.inform_entity_changes(commands) {
            self.rebuild_compressed_actives();
        }
    }

    /// Delivers queued removals, then insertions, to every listener.
    ///
    /// Returns `false` if nothing was queued.
    pub fn inform_entity_changes(&mut self, commands: &mut DeferredCommands) -> bool {
        if self.inserted_ids.is_empty() && self.removed_ids.is_empty() {
            return false;
        }

        self.transfer_bits_to_ids();
        for listener in &mut self.listeners {
            if !self.removed.is_empty() {
                listener.removed(&self.removed, commands);
            }
            if !self.inserted.is_empty() {
                listener.inserted(&self.inserted, commands);
            }
        }

        self.inserted.clear();
        self.removed.clear();
        true
    }

    /// Rebuilds the ascending entity list from the active bitset.
    pub fn rebuild_compressed_actives(&mut self) {
        self.entities.clear();
        self.entities
            .extend(self.active_entity_ids.iter().map(EntityId::from_index));
    }

    fn insert(&mut self, entity: EntityId) {
        self.active_entity_ids.set(entity.index());
        self.inserted_ids.set(entity.index());
    }

    fn remove(&mut self, entity: EntityId) {
        self.active_entity_ids.clear(entity.index());
        self.removed_ids.set(entity.index());
    }

    fn transfer_bits_to_ids(&mut self) {
        self.inserted
            .extend(self.inserted_ids.iter().map(EntityId::from_index));
        self.removed
            .extend(self.removed_ids.iter().map(EntityId::from_index));
        self.inserted_ids.clear_all();
        self.removed_ids.clear_all();
    }
}

/// Owns every subscription, keyed by structural builder equality.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    by_builder: HashMap<AspectBuilder, SubscriptionId>,
    subscriptions: Vec<Subscription>,
    changed_ids: Vec<EntityId>,
    deleted_ids: Vec<EntityId>,
}

impl SubscriptionManager {
    /// Creates a manager with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing subscription for an equal builder.
    #[must_use]
    pub fn get(&self, builder: &AspectBuilder) -> Option<SubscriptionId> {
        self.by_builder.get(builder).copied()
    }

    /// Returns the subscription for `builder`, creating it on first request.
    ///
    /// A new subscription is synchronized against every known identity and
    /// every active entity before it is returned, so it is immediately
    /// consistent.
    pub fn get_or_create(
        &mut self,
        builder: &AspectBuilder,
        registry: &mut ComponentTypeRegistry,
        lifecycle: &EntityLifecycle,
    ) -> SubscriptionId {
        if let Some(id) = self.get(builder) {
            return id;
        }

        let aspect = builder.build(registry);
        let mut subscription = Subscription::new(builder.clone(), aspect);
        lifecycle.synchronize(&mut subscription, &mut DeferredCommands::default());

        let id = SubscriptionId(self.subscriptions.len());
        tracing::debug!(
            subscription = id.index(),
            entities = subscription.entities().len(),
            "subscription created"
        );
        self.by_builder.insert(builder.clone(), id);
        self.subscriptions.push(subscription);
        id
    }

    /// Subscription by handle.
    #[must_use]
    pub fn subscription(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.subscriptions.get(id.0)
    }

    /// Mutable subscription by handle.
    pub fn subscription_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(id.0)
    }

    /// Number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Iterates over subscriptions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> + '_ {
        self.subscriptions.iter()
    }

    /// Pushes a newly discovered identity to every subscription.
    pub fn process_component_identity(&mut self, identity: CompositionId, composition: &BitComposition) {
        for subscription in &mut self.subscriptions {
            subscription.process_component_identity(identity, composition);
        }
    }

    /// Runs one round over every subscription in registration order.
    ///
    /// Both bitsets are converted to ID lists once and cleared for the next
    /// round.
    pub fn process(
        &mut self,
        changed: &mut BitComposition,
        deleted: &mut BitComposition,
        lifecycle: &EntityLifecycle,
        commands: &mut DeferredCommands,
    ) {
        self.changed_ids.clear();
        self.changed_ids.extend(changed.iter().map(EntityId::from_index));
        self.deleted_ids.clear();
        self.deleted_ids.extend(deleted.iter().map(EntityId::from_index));
        changed.clear_all();
        deleted.clear_all();

        for subscription in &mut self.subscriptions {
            subscription.process(&self.changed_ids, &self.deleted_ids, lifecycle, commands);
        }
    }

    /// Entities reported changed in the last round.
    #[must_use]
    pub fn changed_ids(&self) -> &[EntityId] {
        &self.changed_ids
    }

    /// Entities reported deleted in the last round.
    #[must_use]
    pub fn deleted_ids(&self) -> &[EntityId] {
        &self.deleted_ids
    }
}
