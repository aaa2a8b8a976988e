//! Database schema definitions and migration.
//!
//! `ensure` is safe to run on every start: the table is created when
//! missing and any column added since the database was created is appended
//! with `ALTER TABLE`.

use rusqlite::Connection;

use super::StoreResult;

/// Current schema version, recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the article table.
pub const TABLE: &str = "articles";

/// `id` is supplied by the article file; `INTEGER PRIMARY KEY` without
/// `AUTOINCREMENT` keeps it as the rowid without assigning values.
const CREATE_ARTICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '',          -- comma separated
    cover TEXT NOT NULL DEFAULT '',
    excerpt TEXT NOT NULL DEFAULT '',
    listed INTEGER NOT NULL DEFAULT 0,
    date_modified TEXT NOT NULL,            -- YYYY-MM-DD
    content TEXT NOT NULL DEFAULT '',
    fingerprint TEXT NOT NULL DEFAULT '',   -- hex BLAKE3 of the raw file
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Columns every version of the schema must have, with the definition used
/// when a column has to be added to an older table.
pub const COLUMNS: &[(&str, &str)] = &[
    ("id", "INTEGER PRIMARY KEY NOT NULL"),
    ("title", "TEXT NOT NULL DEFAULT ''"),
    ("tags", "TEXT NOT NULL DEFAULT ''"),
    ("cover", "TEXT NOT NULL DEFAULT ''"),
    ("excerpt", "TEXT NOT NULL DEFAULT ''"),
    ("listed", "INTEGER NOT NULL DEFAULT 0"),
    ("date_modified", "TEXT NOT NULL DEFAULT '1970-01-01'"),
    ("content", "TEXT NOT NULL DEFAULT ''"),
    ("fingerprint", "TEXT NOT NULL DEFAULT ''"),
    ("created_at", "TEXT NOT NULL DEFAULT '1970-01-01 00:00:00+00:00'"),
    ("updated_at", "TEXT NOT NULL DEFAULT '1970-01-01 00:00:00+00:00'"),
];

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_articles_date_modified ON articles(date_modified)",
    "CREATE INDEX IF NOT EXISTS idx_articles_listed ON articles(listed)",
];

/// Pragmas applied to file-backed databases.
pub const WRITE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
"#;

/// Create the article table and bring it up to the current shape.
pub fn ensure(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(CREATE_ARTICLES_TABLE)?;

    let existing = existing_columns(conn)?;
    for (name, definition) in COLUMNS {
        if !existing.iter().any(|column| column == name) {
            log::info!("Adding missing column {}.{}", TABLE, name);
            conn.execute_batch(&format!(
                "ALTER TABLE {TABLE} ADD COLUMN {name} {definition}"
            ))?;
        }
    }

    for sql in CREATE_INDEXES {
        conn.execute_batch(sql)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Column names currently present on the article table.
pub fn existing_columns(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_all_columns() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn).unwrap();

        let columns = existing_columns(&conn).unwrap();
        for (name, _) in COLUMNS {
            assert!(columns.iter().any(|c| c == name), "missing column {name}");
        }
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn).unwrap();
        ensure(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_ensure_adds_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE articles (id INTEGER PRIMARY KEY NOT NULL, title TEXT NOT NULL DEFAULT '')",
        )
        .unwrap();
        conn.execute("INSERT INTO articles (id, title) VALUES (1, 'old')", [])
            .unwrap();

        ensure(&conn).unwrap();

        let columns = existing_columns(&conn).unwrap();
        assert_eq!(columns.len(), COLUMNS.len());
        let fingerprint: String = conn
            .query_row("SELECT fingerprint FROM articles WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(fingerprint, "");
    }
}
