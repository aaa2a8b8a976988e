//! Article store.
//!
//! The pipeline writes through the [`Store`] trait so it never depends on a
//! particular backend. [`SqliteStore`] is the shipped implementation.
//!
//! * [`schema`]: idempotent table creation and column migration.
//! * [`sqlite`]: the rusqlite-backed store used by the sync pipeline.
//! * [`query`]: read-only listing and lookup consumed by serving layers.

pub mod query;
pub mod schema;
pub mod sqlite;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::content::Record;

pub use query::{ListQuery, RecordPage, RecordSummary};
pub use sqlite::SqliteStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the article store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file.
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Identity, fingerprint and creation time of a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFingerprint {
    pub id: i64,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Write-side operations the sync pipeline needs from a backend.
///
/// The store is owned by the committer thread while the pipeline runs and
/// handed back to the coordinator for orphan deletion, so it must be `Send`
/// but never needs to be shared.
pub trait Store: Send {
    /// Create or migrate the schema so it matches [`Record`].
    fn ensure_schema(&mut self) -> StoreResult<()>;

    /// Every stored identity with its fingerprint and creation time.
    fn load_fingerprints(&self) -> StoreResult<Vec<StoredFingerprint>>;

    /// Insert records as one bulk operation. Returns the number written.
    fn insert_batch(&mut self, records: &[Record]) -> StoreResult<usize>;

    /// Insert or replace a single record by identity.
    fn upsert(&mut self, record: &Record) -> StoreResult<()>;

    /// Titles of the given identities that exist in the store.
    fn titles(&self, ids: &[i64]) -> StoreResult<Vec<(i64, String)>>;

    /// Delete the given identities as one bulk operation. Returns the
    /// number of rows removed.
    fn delete_batch(&mut self, ids: &[i64]) -> StoreResult<usize>;
}
