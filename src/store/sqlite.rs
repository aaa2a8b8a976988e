//! SQLite-backed article store.
//!
//! # Write path
//!
//! - Bulk inserts run inside one transaction with a cached prepared statement
//! - Updates are single-row upserts keyed by the article identity
//! - WAL mode so a serving process can read while a sync writes

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, Row};

use super::{schema, Store, StoreError, StoreResult, StoredFingerprint};
use crate::content::Record;

/// SQLite caps host parameters per statement; id lists are chunked below it.
const MAX_IDS_PER_STATEMENT: usize = 500;

/// Insert-or-replace keyed by `id`. `created_at` is only written on first
/// insert so a colliding write never rewinds the original creation time.
const UPSERT_SQL: &str = r#"
INSERT INTO articles (
    id, title, tags, cover, excerpt, listed, date_modified,
    content, fingerprint, created_at, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    tags = excluded.tags,
    cover = excluded.cover,
    excerpt = excluded.excerpt,
    listed = excluded.listed,
    date_modified = excluded.date_modified,
    content = excluded.content,
    fingerprint = excluded.fingerprint,
    updated_at = excluded.updated_at
"#;

/// Column list matching [`record_from_row`].
pub(crate) const RECORD_COLUMNS: &str = "id, title, tags, cover, excerpt, listed, date_modified, \
     content, fingerprint, created_at, updated_at";

/// Article store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create {}: {}", parent.display(), e);
            }
        }

        let open = || -> rusqlite::Result<Connection> {
            let conn = Connection::open(path)?;
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(schema::WRITE_PRAGMAS)?;
            Ok(conn)
        };
        let conn = open().map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Opened article store at {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn, path: None })
    }

    /// Location of the database file, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for SqliteStore {
    fn ensure_schema(&mut self) -> StoreResult<()> {
        schema::ensure(&self.conn)
    }

    fn load_fingerprints(&self) -> StoreResult<Vec<StoredFingerprint>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, fingerprint, created_at FROM articles")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredFingerprint {
                    id: row.get(0)?,
                    fingerprint: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_batch(&mut self, records: &[Record]) -> StoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for record in records {
                execute_upsert(&mut stmt, record)?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn upsert(&mut self, record: &Record) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(UPSERT_SQL)?;
        execute_upsert(&mut stmt, record)?;
        Ok(())
    }

    fn titles(&self, ids: &[i64]) -> StoreResult<Vec<(i64, String)>> {
        let mut titles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!(
                "SELECT id, title FROM articles WHERE id IN ({}) ORDER BY id",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            titles.extend(rows);
        }
        Ok(titles)
    }

    fn delete_batch(&mut self, ids: &[i64]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut removed = 0;
        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!(
                "DELETE FROM articles WHERE id IN ({})",
                placeholders(chunk.len())
            );
            removed += tx.execute(&sql, params_from_iter(chunk.iter()))?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

fn execute_upsert(stmt: &mut rusqlite::CachedStatement<'_>, record: &Record) -> StoreResult<()> {
    stmt.execute(params![
        record.id,
        record.title,
        join_tags(&record.tags),
        record.cover,
        record.excerpt,
        record.listed,
        record.date_modified,
        record.content,
        record.fingerprint,
        record.created_at,
        record.updated_at,
    ])?;
    Ok(())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Tags are stored comma separated.
pub(crate) fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

pub(crate) fn split_tags(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map a row selected with [`RECORD_COLUMNS`] into a [`Record`].
pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let tags: String = row.get(2)?;
    Ok(Record {
        id: row.get(0)?,
        title: row.get(1)?,
        tags: split_tags(&tags),
        cover: row.get(3)?,
        excerpt: row.get(4)?,
        listed: row.get(5)?,
        date_modified: row.get(6)?,
        content: row.get(7)?,
        fingerprint: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
