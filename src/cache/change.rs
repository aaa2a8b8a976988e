//! Concurrency-safe identity → fingerprint map.
//!
//! A single `RwLock` guards the whole map. Runs deal with hundreds to a few
//! thousand articles, well below the point where lock contention shows up.
//! TODO: shard by identity hash if corpora reach hundreds of thousands of files.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::CacheEntry;

/// How a processed file relates to what the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Identity not in the store
    New,
    /// Identity known, fingerprint identical
    Unchanged,
    /// Identity known, fingerprint differs
    Updated,
}

/// Result of [`ChangeCache::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub change: Change,
    /// Creation time to persist: the original one for known identities,
    /// `now` for new ones.
    pub created_at: DateTime<Utc>,
    /// Another file already confirmed this identity earlier in the run.
    pub duplicate: bool,
}

/// Per-run change cache shared by all workers and the reaper.
#[derive(Debug, Default)]
pub struct ChangeCache {
    entries: RwLock<HashMap<i64, CacheEntry>>,
}

impl ChangeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from rows already in the store, all unconfirmed.
    pub fn preload<I, E>(rows: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<CacheEntry>,
    {
        let entries = rows
            .into_iter()
            .map(Into::into)
            .map(|entry: CacheEntry| (entry.id, entry))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<i64, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<i64, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up an identity.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<CacheEntry> {
        self.read().get(&id).cloned()
    }

    /// Insert or replace the entry for an identity.
    pub fn set(&self, id: i64, entry: CacheEntry) {
        self.write().insert(id, entry);
    }

    /// Classify a processed file and confirm its identity in one step.
    ///
    /// Lookup and update happen under the same write lock, so two files
    /// racing on one identity cannot both be classified as new.
    pub fn classify(&self, id: i64, fingerprint: &str, now: DateTime<Utc>) -> Classification {
        let mut entries = self.write();

        match entries.get_mut(&id) {
            Some(entry) => {
                let duplicate = entry.confirmed;
                let change = if entry.fingerprint == fingerprint {
                    Change::Unchanged
                } else {
                    entry.fingerprint = fingerprint.to_string();
                    Change::Updated
                };
                entry.confirmed = true;
                Classification {
                    change,
                    created_at: entry.created_at,
                    duplicate,
                }
            }
            None => {
                entries.insert(
                    id,
                    CacheEntry::confirmed(id, fingerprint.to_string(), now),
                );
                Classification {
                    change: Change::New,
                    created_at: now,
                    duplicate: false,
                }
            }
        }
    }

    /// Identities never confirmed in this run, ascending.
    #[must_use]
    pub fn orphans(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .read()
            .values()
            .filter(|entry| !entry.confirmed)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of identities tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of identities confirmed so far.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        self.read().values().filter(|entry| entry.confirmed).count()
    }
}
