//! # TESSERA Core Engine
//!
//! The matching-and-synchronization core of an Entity Component System.
//! Decides which subscriptions are interested in which entities as entity
//! composition changes, without re-scanning every entity every frame.
//!
//! ## Architecture Rules
//!
//! 1. **Structural edits are batched** - nothing changes until `World::synchronize`
//! 2. **Aspects are paid once per composition** - per-entity checks are a bit lookup
//! 3. **IDs are recycled only after retirement** - listeners see every deletion first
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{AspectBuilder, Component, World};
//!
//! struct Position;
//! impl Component for Position {}
//!
//! let mut world = World::new();
//! let position = world.registry_mut().register::<Position>();
//! let movers = world.subscribe(&AspectBuilder::new().require([position]))?;
//!
//! let e = world.create();
//! world.edit(e)?.add(position);
//! world.synchronize()?;
//! assert_eq!(world.subscription(movers)?.entities(), &[e]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod sync;

pub use config::WorldConfig;
pub use ecs::{
    Archetype, Aspect, AspectBuilder, BitComposition, Component, ComponentKind, ComponentStore,
    ComponentType, ComponentTypeRegistry, CompositionId, CompositionIdentityResolver,
    DeferredCommand, DeferredCommands, EntityEdit, EntityEditPool, EntityId, EntityLifecycle,
    RecyclingIdFactory, Subscription, SubscriptionId, SubscriptionListener, SubscriptionManager,
    World,
};
pub use error::{EcsError, EcsResult};
pub use sync::SharedWorld;
