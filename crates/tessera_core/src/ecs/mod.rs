//! # Entity Component System
//!
//! Matching and synchronization core: which subscriptions are interested in
//! which entities, maintained incrementally as compositions change.
//!
//! ## Design Philosophy
//!
//! - Structural changes are staged and applied at one synchronization point
//! - Distinct compositions get small integer identities
//! - Aspects are evaluated per identity, never per entity
//! - Entity IDs are recycled only after their deletion was observed

mod archetype;
mod aspect;
mod component;
mod composition;
mod edit;
mod entity;
mod identity;
mod lifecycle;
mod subscription;
mod world;

pub use archetype::Archetype;
pub use aspect::{Aspect, AspectBuilder};
pub use component::{Component, ComponentKind, ComponentStore, ComponentType, ComponentTypeRegistry};
pub use composition::{BitComposition, SetBits};
pub use edit::{EntityEdit, EntityEditPool};
pub use entity::{EntityId, RecyclingIdFactory};
pub use identity::{CompositionId, CompositionIdentityResolver};
pub use lifecycle::EntityLifecycle;
pub use subscription::{
    DeferredCommand, DeferredCommands, Subscription, SubscriptionId, SubscriptionListener,
    SubscriptionManager,
};
pub use world::World;
