//! # Component Types
//!
//! The core never stores component payloads. It only tracks which kinds an
//! entity has, as bit indices handed out by a per-world registry.
//!
//! A kind is introduced to a world once with
//! [`ComponentTypeRegistry::register`]; the returned [`ComponentType`] handle
//! is then reused for edits and aspects instead of re-deriving the index from
//! the Rust type every time.

use std::any::{type_name, TypeId};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::archetype::Archetype;
use super::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Marker trait for ECS components.
///
/// # Example
///
/// ```rust,ignore
/// struct Position { x: f32, y: f32 }
///
/// impl Component for Position {}
/// ```
pub trait Component: Send + Sync + 'static {}

/// Type token identifying a component kind, before it has an index.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Token for component type `C`.
    #[inline]
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: type_name::<C>(),
        }
    }

    /// Rust type name of the kind.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl PartialOrd for ComponentKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_id.cmp(&other.type_id)
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Registration handle for a component kind within one world.
///
/// Indices start at 0, are assigned in registration order and are never
/// reused while the world lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentType {
    index: u32,
    kind: ComponentKind,
}

impl ComponentType {
    /// Bit index of this type in compositions.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// The kind this handle was registered for.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ComponentKind {
        self.kind
    }
}

impl From<ComponentType> for ComponentKind {
    fn from(ty: ComponentType) -> Self {
        ty.kind
    }
}

/// Assigns each distinct component kind a stable index.
///
/// There is no removal: kinds stay registered for the world's lifetime.
#[derive(Debug, Default)]
pub struct ComponentTypeRegistry {
    by_kind: HashMap<ComponentKind, ComponentType>,
    types: Vec<ComponentType>,
}

impl ComponentTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `C`, or returns its existing handle.
    pub fn register<C: Component>(&mut self) -> ComponentType {
        self.register_kind(ComponentKind::of::<C>())
    }

    /// Registers a kind token, or returns its existing handle.
    ///
    /// The first call for a new kind allocates the next sequential index.
    pub fn register_kind(&mut self, kind: ComponentKind) -> ComponentType {
        if let Some(&ty) = self.by_kind.get(&kind) {
            return ty;
        }

        let index = u32::try_from(self.types.len()).unwrap_or(u32::MAX);
        let ty = ComponentType { index, kind };
        self.by_kind.insert(kind, ty);
        self.types.push(ty);
        ty
    }

    /// Index for a kind, registering it on first use.
    pub fn index_for(&mut self, kind: ComponentKind) -> usize {
        self.register_kind(kind).index()
    }

    /// Handle for an already registered kind.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponentType`] if the kind was never registered.
    pub fn lookup(&self, kind: ComponentKind) -> EcsResult<ComponentType> {
        self.by_kind
            .get(&kind)
            .copied()
            .ok_or(EcsError::UnknownComponentType { name: kind.name() })
    }

    /// Inverse lookup from index to handle.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponentIndex`] for an index never issued.
    pub fn type_for(&self, index: usize) -> EcsResult<ComponentType> {
        self.types
            .get(index)
            .copied()
            .ok_or(EcsError::UnknownComponentIndex(
                u32::try_from(index).unwrap_or(u32::MAX),
            ))
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over handles in index order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentType> + '_ {
        self.types.iter().copied()
    }
}

/// Boundary to the component payload storage, which lives outside the core.
///
/// [`EntityEdit::add_with`](super::EntityEdit::add_with) and
/// [`World::create_from_archetype`](super::World::create_from_archetype)
/// forward payload work here while the core keeps the presence bits.
pub trait ComponentStore {
    /// Payload type handed to the store.
    type Value;

    /// Stores a payload for `entity`.
    fn add_component(&mut self, entity: EntityId, ty: ComponentType, value: Self::Value);

    /// Drops the payload of `ty` for `entity`, if any.
    fn remove_component(&mut self, entity: EntityId, ty: ComponentType);

    /// Reads a payload.
    fn component(&self, entity: EntityId, ty: ComponentType) -> Option<&Self::Value>;

    /// Populates every component of `archetype` for a freshly created entity.
    fn bulk_add(&mut self, entity: EntityId, archetype: &Archetype);
}
