//! # Entity Edits
//!
//! Structural changes are staged on an [`EntityEdit`] and only take effect
//! at the next synchronization pass, where each edited entity has its
//! composition identity recomputed exactly once.
//!
//! ## Double Buffering
//!
//! ```text
//! Between passes:  obtain_editor() → edited
//! Pass begins:     swap(edited, alternate_edited)
//!                  drain alternate_edited → identities, changed set, pool
//! ```
//!
//! Edit objects are returned to a pool and reused, so steady-state editing
//! does not allocate.

use super::component::{ComponentStore, ComponentType};
use super::composition::BitComposition;
use super::entity::EntityId;
use super::lifecycle::EntityLifecycle;
use super::subscription::SubscriptionManager;
use crate::error::{EcsError, EcsResult};

/// Staged composition changes for one entity.
///
/// The pending composition starts as a copy of the entity's last resolved
/// composition, so independent `add`/`remove` calls compose.
#[derive(Clone, Debug)]
pub struct EntityEdit {
    entity: EntityId,
    composition: BitComposition,
}

impl EntityEdit {
    fn new(entity: EntityId) -> Self {
        Self {
            entity,
            composition: BitComposition::new(),
        }
    }

    fn reset(&mut self, entity: EntityId, seed: Option<&BitComposition>) {
        self.entity = entity;
        match seed {
            Some(bits) => self.composition.copy_from(bits),
            None => self.composition.clear_all(),
        }
    }

    /// Entity being edited.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Pending composition.
    #[inline]
    #[must_use]
    pub fn composition(&self) -> &BitComposition {
        &self.composition
    }

    /// Returns `true` if the pending composition contains `ty`.
    #[inline]
    #[must_use]
    pub fn has(&self, ty: ComponentType) -> bool {
        self.composition.get(ty.index())
    }

    /// Marks `ty` as present.
    pub fn add(&mut self, ty: ComponentType) -> &mut Self {
        self.composition.set(ty.index());
        self
    }

    /// Marks `ty` as absent.
    pub fn remove(&mut self, ty: ComponentType) -> &mut Self {
        self.composition.clear(ty.index());
        self
    }

    /// Stores a payload in `store` and marks `ty` as present.
    pub fn add_with<S: ComponentStore>(
        &mut self,
        store: &mut S,
        ty: ComponentType,
        value: S::Value,
    ) -> &mut Self {
        store.add_component(self.entity, ty, value);
        self.add(ty)
    }

    /// Drops the payload from `store` if present, and marks `ty` as absent.
    pub fn remove_with<S: ComponentStore>(&mut self, store: &mut S, ty: ComponentType) -> &mut Self {
        if self.has(ty) {
            store.remove_component(self.entity, ty);
            self.remove(ty);
        }
        self
    }
}

/// Batches edits and deletions until the next synchronization pass.
#[derive(Debug)]
pub struct EntityEditPool {
    /// Finalized edits ready for reuse.
    pool: Vec<EntityEdit>,
    /// Edits opened since the last pass.
    edited: Vec<EntityEdit>,
    /// Swap target for `edited` while a pass drains it.
    alternate_edited: Vec<EntityEdit>,
    /// Bit per entity with an open edit.
    edited_ids: BitComposition,
    /// Bit per entity deleted since the last pass.
    pending_deletion: BitComposition,
}

impl EntityEditPool {
    /// Creates a pool with `capacity` edit objects preallocated.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: (0..capacity)
                .map(|_| EntityEdit::new(EntityId::new(0)))
                .collect(),
            edited: Vec::with_capacity(capacity),
            alternate_edited: Vec::with_capacity(capacity),
            edited_ids: BitComposition::new(),
            pending_deletion: BitComposition::new(),
        }
    }

    /// Returns the entity's open edit, opening one if needed.
    ///
    /// Repeated calls between two passes return the same edit.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InactiveEntity`] if the entity is not live; the pool is
    ///   left untouched.
    /// - [`EcsError::DuplicateEditResolution`] if pool bookkeeping is corrupt.
    pub fn obtain_editor(
        &mut self,
        entity: EntityId,
        lifecycle: &EntityLifecycle,
    ) -> EcsResult<&mut EntityEdit> {
        if self.edited_ids.get(entity.index()) {
            let slot = self.find_edit(entity)?;
            return Ok(&mut self.edited[slot]);
        }

        if !lifecycle.is_active(entity) {
            return Err(EcsError::InactiveEntity(entity));
        }

        Ok(self.open(entity, lifecycle.resolved_composition(entity)))
    }

    /// Opens an edit for an entity that was just issued.
    ///
    /// Fresh IDs never have an open edit: IDs are reissued only after the
    /// pass that retired them drained every edit.
    pub(crate) fn open_fresh(&mut self, entity: EntityId) -> &mut EntityEdit {
        debug_assert!(!self.edited_ids.get(entity.index()), "fresh entity already edited");
        self.open(entity, None)
    }

    /// Open edit for an entity, if any.
    #[must_use]
    pub fn open_edit(&self, entity: EntityId) -> Option<&EntityEdit> {
        if !self.edited_ids.get(entity.index()) {
            return None;
        }
        self.edited.iter().rev().find(|edit| edit.entity == entity)
    }

    /// Schedules an entity for deletion.
    ///
    /// An open edit is finalized immediately; later edits are pointless.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEditResolution`] if pool bookkeeping is corrupt.
    pub fn delete(
        &mut self,
        entity: EntityId,
        lifecycle: &mut EntityLifecycle,
        subscriptions: &mut SubscriptionManager,
    ) -> EcsResult<()> {
        self.pending_deletion.set(entity.index());

        if self.edited_ids.get(entity.index()) {
            self.process_and_remove(entity, lifecycle, subscriptions)?;
        }
        Ok(())
    }

    /// Returns `true` if the entity is scheduled for deletion.
    #[inline]
    #[must_use]
    pub fn is_pending_deletion(&self, entity: EntityId) -> bool {
        self.pending_deletion.get(entity.index())
    }

    /// Returns `true` if the entity has an open edit.
    #[inline]
    #[must_use]
    pub fn is_edited(&self, entity: EntityId) -> bool {
        self.edited_ids.get(entity.index())
    }

    /// Number of edits open since the last pass.
    #[inline]
    #[must_use]
    pub fn open_edit_count(&self) -> usize {
        self.edited.len()
    }

    /// Number of edit objects waiting for reuse.
    #[inline]
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Applies every open edit and pending deletion.
    ///
    /// Edited entities not pending deletion are added to `changed`; pending
    /// deletions are merged into `deleted`. Returns `false` if there was
    /// nothing to do, so the caller can stop looping.
    pub fn process_entities(
        &mut self,
        lifecycle: &mut EntityLifecycle,
        subscriptions: &mut SubscriptionManager,
        changed: &mut BitComposition,
        deleted: &mut BitComposition,
    ) -> bool {
        if self.edited.is_empty() && self.pending_deletion.is_empty() {
            return false;
        }

        self.edited_ids.clear_all();
        std::mem::swap(&mut self.edited, &mut self.alternate_edited);

        for edit in self.alternate_edited.drain(..) {
            lifecycle.apply_edit(&edit, subscriptions);

            if !self.pending_deletion.get(edit.entity.index()) {
                changed.set(edit.entity.index());
            }

            self.pool.push(edit);
        }

        deleted.union_with(&self.pending_deletion);
        self.pending_deletion.clear_all();

        true
    }

    fn open(&mut self, entity: EntityId, seed: Option<&BitComposition>) -> &mut EntityEdit {
        let mut edit = self
            .pool
            .pop()
            .unwrap_or_else(|| EntityEdit::new(entity));
        edit.reset(entity, seed);

        self.edited_ids.set(entity.index());
        self.edited.push(edit);
        let last = self.edited.len() - 1;
        &mut self.edited[last]
    }

    fn process_and_remove(
        &mut self,
        entity: EntityId,
        lifecycle: &mut EntityLifecycle,
        subscriptions: &mut SubscriptionManager,
    ) -> EcsResult<()> {
        let slot = self.find_edit(entity)?;
        let edit = self.edited.swap_remove(slot);
        lifecycle.apply_edit(&edit, subscriptions);

        self.pool.push(edit);
        self.edited_ids.clear(entity.index());
        Ok(())
    }

    fn find_edit(&self, entity: EntityId) -> EcsResult<usize> {
        // Recently edited entities are the likeliest to be edited again
        self.edited
            .iter()
            .rposition(|edit| edit.entity == entity)
            .ok_or(EcsError::DuplicateEditResolution(entity))
    }
}
