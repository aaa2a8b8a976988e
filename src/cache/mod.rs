//! Change cache for one sync run.
//!
//! This module tracks, per article identity, the fingerprint last written
//! to the store so workers can decide whether a file is new, changed, or
//! unchanged without touching the store.
//!
//! # Architecture
//!
//! * [`entry`]: the per-identity [`CacheEntry`] and its preload conversion.
//! * [`change`]: the concurrency-safe [`ChangeCache`] map.
//!
//! # Lifecycle
//!
//! Entries are preloaded from the store with `confirmed = false`. Each
//! processed file confirms its identity. Whatever is still unconfirmed
//! after all workers finish is an orphan: its source file is gone.

pub mod change;
pub mod entry;

pub use change::{Change, ChangeCache, Classification};
pub use entry::CacheEntry;
