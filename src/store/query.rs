//! Read-only queries over synced articles.
//!
//! These are the operations a serving layer consumes: a paginated,
//! optionally tag-filtered listing, lookup by identity, and the tag set.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::sqlite::{record_from_row, split_tags, RECORD_COLUMNS};
use super::{SqliteStore, StoreResult};
use crate::content::Record;

/// Default page size for listings.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Listing parameters. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    /// Only articles carrying this tag
    pub tag: Option<String>,
    /// Only articles flagged `listed`
    pub listed_only: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            tag: None,
            listed_only: false,
        }
    }
}

impl ListQuery {
    fn limit(&self) -> i64 {
        i64::from(self.per_page.max(1))
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }
}

/// An article without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub id: i64,
    pub title: String,
    pub tags: Vec<String>,
    pub cover: String,
    pub excerpt: String,
    pub listed: bool,
    pub date_modified: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPage {
    pub items: Vec<RecordSummary>,
    /// Matching articles across all pages
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl RecordPage {
    /// Number of pages needed for `total` articles.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        let per_page = u64::from(self.per_page.max(1));
        self.total.div_ceil(per_page)
    }
}

/// `tags` is comma separated; wrapping both sides in commas gives an exact
/// element match.
const FILTER_SQL: &str = "(?1 IS NULL OR (',' || tags || ',') LIKE ('%,' || ?1 || ',%')) \
     AND (?2 = 0 OR listed = 1)";

impl SqliteStore {
    /// List articles, newest `date_modified` first.
    pub fn list_records(&self, query: &ListQuery) -> StoreResult<RecordPage> {
        let conn = self.connection();
        let tag = query.tag.as_deref();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM articles WHERE {FILTER_SQL}"),
            params![tag, query.listed_only],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, title, tags, cover, excerpt, listed, date_modified, updated_at \
             FROM articles WHERE {FILTER_SQL} \
             ORDER BY date_modified DESC, id DESC LIMIT ?3 OFFSET ?4"
        ))?;
        let items = stmt
            .query_map(
                params![tag, query.listed_only, query.limit(), query.offset()],
                |row| {
                    let tags: String = row.get(2)?;
                    Ok(RecordSummary {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        tags: split_tags(&tags),
                        cover: row.get(3)?,
                        excerpt: row.get(4)?,
                        listed: row.get(5)?,
                        date_modified: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordPage {
            items,
            total: u64::try_from(total).unwrap_or(0),
            page: query.page.max(1),
            per_page: query.per_page.max(1),
        })
    }

    /// Fetch one article by identity.
    pub fn get_record(&self, id: i64) -> StoreResult<Option<Record>> {
        let record = self
            .connection()
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM articles WHERE id = ?1"),
                [id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Every distinct tag, sorted.
    pub fn tags(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT DISTINCT tags FROM articles WHERE tags != ''")?;
        let mut tags = BTreeSet::new();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for row in rows {
            tags.extend(split_tags(&row?));
        }
        Ok(tags.into_iter().collect())
    }

    /// Number of stored articles.
    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .connection()
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
