//! # Shared World Handle
//!
//! A cloneable, thread-safe handle around one [`World`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::WorldConfig;
use crate::ecs::World;
use crate::error::EcsResult;

/// Cloneable handle to a world behind a mutex.
///
/// ## Usage
///
/// ```rust,ignore
/// let shared = SharedWorld::new(World::new());
///
/// let worker = shared.clone();
/// std::thread::spawn(move || {
///     worker.with(|world| {
///         let e = world.create();
///         let _ = world.edit(e).map(|edit| edit.add(position));
///     });
/// });
///
/// // Logic loop: each frame sees every edit queued so far
/// let moving = shared.frame(|world| world.subscription(movers).map(|s| s.entities().len()))??;
/// ```
#[derive(Clone, Debug)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
    frames: Arc<AtomicU64>,
}

impl Default for SharedWorld {
    fn default() -> Self {
        Self::new(World::new())
    }
}

impl SharedWorld {
    /// Wraps an existing world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a shared world sized from `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self::new(World::with_config(config))
    }

    /// Locks the world, synchronizes it, then runs `f`.
    ///
    /// The frame counter only advances when synchronization succeeds.
    ///
    /// # Errors
    ///
    /// Returns the synchronization error; `f` is not run in that case.
    pub fn frame<R>(&self, f: impl FnOnce(&mut World) -> R) -> EcsResult<R> {
        let mut world = self.inner.lock();
        let rounds = world.synchronize()?;
        let frame = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(frame, rounds, "frame synchronized");
        Ok(f(&mut world))
    }

    /// Locks the world and runs `f` without synchronizing.
    pub fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Number of frames synchronized through any handle.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Returns `true` if another handle currently holds the world.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Unwraps the world if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns the handle back if other clones are still alive.
    pub fn try_into_inner(self) -> Result<World, Self> {
        let frames = self.frames;
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner, frames })
    }
}
