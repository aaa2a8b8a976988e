//! Front matter parser.
//!
//! Front matter is line-oriented `key: value` YAML written by hand, so
//! titles such as `title: Rust: The Good Parts` are common. Before decoding,
//! any line whose value contains a colon and is not already quoted gets its
//! value wrapped in double quotes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::{ContentError, Record};

/// Delimiter that opens and closes the front matter block.
pub const DELIMITER: &str = "---";

/// Required format of `dateModified`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    listed: Option<bool>,
    #[serde(default)]
    date_modified: Option<String>,
}

/// Parse raw article bytes into a [`Record`].
///
/// The returned record has an empty fingerprint and epoch timestamps; the
/// caller fills those in.
///
/// # Errors
///
/// Returns [`ContentError`] when the bytes are not UTF-8, the front matter
/// delimiters are missing, the front matter cannot be decoded, or the date
/// is not `YYYY-MM-DD`.
pub fn parse_record(bytes: &[u8]) -> Result<Record, ContentError> {
    let text = std::str::from_utf8(bytes)?;

    let mut parts = text.splitn(3, DELIMITER);
    let (Some(_), Some(front_matter), Some(body)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ContentError::MissingFrontMatter);
    };

    let front_matter: FrontMatter = serde_yaml::from_str(&quote_colon_values(front_matter))?;
    let raw_date = front_matter.date_modified.unwrap_or_default();
    let date_modified = parse_date(raw_date.trim())?;

    Ok(Record {
        id: front_matter.id,
        title: front_matter.title.unwrap_or_default(),
        tags: front_matter.tags.unwrap_or_default(),
        cover: front_matter.cover.unwrap_or_default(),
        excerpt: front_matter.excerpt.unwrap_or_default(),
        listed: front_matter.listed.unwrap_or(false),
        date_modified,
        content: body.trim().to_string(),
        fingerprint: String::new(),
        created_at: DateTime::<Utc>::default(),
        updated_at: DateTime::<Utc>::default(),
    })
}

/// Quote values that contain a colon so they decode as plain strings.
///
/// Only the first colon of a line separates key from value. Values that
/// already start with a quote character are left alone.
#[must_use]
pub fn quote_colon_values(front_matter: &str) -> String {
    front_matter
        .split('\n')
        .map(|line| match line.split_once(':') {
            Some((key, value)) => {
                let value = value.trim();
                if value.contains(':') && !value.starts_with('"') && !value.starts_with('\'') {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    format!("{key}: \"{escaped}\"")
                } else {
                    line.to_string()
                }
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_date(value: &str) -> Result<NaiveDate, ContentError> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(ContentError::Date {
            value: value.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        });
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| ContentError::Date {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
