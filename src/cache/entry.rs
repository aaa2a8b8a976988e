//! Cache entry definitions.

use chrono::{DateTime, Utc};

use crate::store::StoredFingerprint;

/// Bookkeeping for one article identity during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: i64,
    /// Fingerprint of the last known file content
    pub fingerprint: String,
    /// First-seen creation time, preserved across updates
    pub created_at: DateTime<Utc>,
    /// Whether a file declaring this identity was seen in this run
    pub confirmed: bool,
}

impl CacheEntry {
    /// An entry for a file processed in the current run.
    #[must_use]
    pub fn confirmed(id: i64, fingerprint: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fingerprint,
            created_at,
            confirmed: true,
        }
    }
}

impl From<StoredFingerprint> for CacheEntry {
    fn from(row: StoredFingerprint) -> Self {
        Self {
            id: row.id,
            fingerprint: row.fingerprint,
            created_at: row.created_at,
            confirmed: false,
        }
    }
}
