//! Article content model and parsing.
//!
//! An article file is a YAML front matter block between two `---`
//! delimiters followed by the Markdown body:
//!
//! ```text
//! ---
//! id: 42
//! title: Ownership: A Primer
//! tags: [rust, memory]
//! cover: https://example.com/cover.webp
//! excerpt: Why the borrow checker is your friend.
//! listed: true
//! dateModified: 2024-03-09
//! ---
//!
//! # Ownership
//! ...
//! ```
//!
//! * [`parser`]: front matter preprocessing and decoding into a [`Record`].
//! * [`fingerprint`]: content hashing used for change detection.

pub mod fingerprint;
pub mod parser;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use fingerprint::fingerprint;
pub use parser::{parse_record, DATE_FORMAT, DELIMITER};

/// A persisted article.
///
/// `id` comes from the file's front matter and is the store's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identity declared by the file itself
    pub id: i64,
    pub title: String,
    pub tags: Vec<String>,
    /// Cover image reference
    pub cover: String,
    pub excerpt: String,
    /// Whether the article appears in listings
    pub listed: bool,
    /// Modification date declared in the front matter
    pub date_modified: NaiveDate,
    /// Markdown body
    pub content: String,
    /// Hex BLAKE3 hash of the raw file bytes
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors produced while turning file bytes into a [`Record`].
#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    /// The file is not valid UTF-8.
    #[error("content is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Fewer than two `---` delimiters were found.
    #[error("invalid article format: missing front matter")]
    MissingFrontMatter,

    /// The front matter block could not be decoded.
    #[error("failed to parse front matter: {0}")]
    Metadata(#[from] serde_yaml::Error),

    /// `dateModified` is not in `YYYY-MM-DD` form.
    #[error("failed to parse date '{value}': {reason}")]
    Date { value: String, reason: String },
}
