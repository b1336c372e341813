//! # Synchronization Across Threads
//!
//! The world itself is single-threaded: one synchronization pass at a time,
//! listeners reached only through their deferred command queue.
//!
//! ## Sharing a World
//!
//! ```text
//! Thread 1 (Logic):  frame(|w| ...)   ──┐
//!                                        ├──► lock ─► synchronize ─► closure
//! Thread 2 (Tools):  with(|w| ...)    ──┘
//! ```
//!
//! Every frame starts from a synchronized world, so subscriptions read
//! inside the closure never lag behind edits made by another thread.

mod shared;

pub use shared::SharedWorld;
