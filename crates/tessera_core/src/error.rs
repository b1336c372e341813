//! # Core Error Types
//!
//! All errors that can be returned by the world and its managers.
//!
//! None of them are transient: each one points at caller misuse or at
//! corrupted bookkeeping, so nothing in this crate retries.

use thiserror::Error;

use crate::ecs::{CompositionId, EntityId};

/// Errors that can occur in the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A read-only lookup asked for a component kind that was never registered.
    #[error("unknown component type: {name}")]
    UnknownComponentType {
        /// Type name of the missing kind.
        name: &'static str,
    },

    /// A component type index that this registry never issued.
    #[error("unknown component type index: {0}")]
    UnknownComponentIndex(u32),

    /// Structural edit or query against an entity that is not live.
    #[error("entity {0} is not active")]
    InactiveEntity(EntityId),

    /// The edit pool marked an edit as open but could not find it.
    #[error("open edit for entity {0} is missing from the edit pool")]
    DuplicateEditResolution(EntityId),

    /// Subscription handle issued by another world.
    #[error("unknown subscription: {0}")]
    UnknownSubscription(usize),

    /// Archetype whose identity this world never resolved.
    #[error("archetype identity {0} does not belong to this world")]
    ForeignArchetype(CompositionId),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type EcsResult<T> = Result<T, EcsError>;
