//! Sample article generator.
//!
//! Writes `article-<id>.md` files with complete front matter. Content is
//! picked by identity, so the same arguments always produce byte-identical
//! files and a second sync of a regenerated tree skips everything.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};

use crate::content::DATE_FORMAT;

const TITLES: &[&str] = &[
    "Understanding Ownership",
    "Best Practices for Code Organization",
    "Introduction to Async Runtimes",
    "Data Structures and Algorithms",
    "Software Testing Fundamentals",
    "Continuous Delivery Pipelines",
    "Designing Service Boundaries",
    "Database Design Principles",
    "Security in Modern Applications",
    "Performance Optimization Techniques",
];

const TAGS: &[&str] = &[
    "programming",
    "rust",
    "web",
    "development",
    "software",
    "engineering",
    "cloud",
    "devops",
    "database",
    "security",
    "performance",
    "testing",
    "architecture",
    "design",
];

const EXCERPTS: &[&str] = &[
    "Learn the fundamentals step by step.",
    "How to keep a growing codebase easy to navigate.",
    "What actually happens when you await a future.",
    "Essential knowledge about data structures and algorithms.",
    "Why tests are the cheapest documentation you can write.",
];

const BODIES: &[&str] = &[
    "# Introduction\n\nWelcome to this guide.\n\n## Getting Started\n\n```rust\nfn main() {\n    println!(\"Hello, world!\");\n}\n```\n\n## Key Concepts\n\n1. First point\n2. Second point\n3. Third point\n\n> Keep functions small.\n",
    "# Main Topic\n\nLet's explore a few ideas.\n\n---\n\n## Benefits\n\n- Improved efficiency\n- Better organization\n- Enhanced readability\n",
    "# Overview\n\n| Step | Description |\n|------|-------------|\n| 1 | Plan |\n| 2 | Build |\n| 3 | Ship |\n\n## Conclusion\n\nThanks for reading!\n",
];

/// Date every generated `dateModified` counts back from.
const BASE_DATE: (i32, u32, u32) = (2024, 6, 1);

/// Errors writing sample articles.
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("count must be greater than 0")]
    EmptyCount,

    #[error("{count} articles starting at id {start_id} run past the largest id")]
    IdRange { start_id: i64, count: usize },

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn pick<'a>(items: &[&'a str], seed: u64) -> &'a str {
    items[(seed % items.len() as u64) as usize]
}

/// Two to four distinct tags derived from `id`.
fn tags_for(id: i64) -> Vec<&'static str> {
    let seed = id.unsigned_abs();
    let count = 2 + (seed % 3) as usize;
    let start = (seed % TAGS.len() as u64) as usize * 7;
    (0..count).map(|i| TAGS[(start + i * 3) % TAGS.len()]).collect()
}

fn date_for(id: i64) -> NaiveDate {
    let (y, m, d) = BASE_DATE;
    let base = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    base.checked_sub_days(Days::new(id.unsigned_abs().wrapping_mul(37) % 365))
        .unwrap_or(base)
}

/// Render the full file for one article.
#[must_use]
pub fn render_article(id: i64) -> String {
    let seed = id.unsigned_abs();
    format!(
        "---\n\
         id: {id}\n\
         title: Sample Article {id}: {title}\n\
         tags: [{tags}]\n\
         cover: https://example.com/covers/{id}.webp\n\
         excerpt: {excerpt}\n\
         listed: {listed}\n\
         dateModified: {date}\n\
         ---\n\n\
         {body}",
        title = pick(TITLES, seed),
        tags = tags_for(id).join(", "),
        excerpt = pick(EXCERPTS, seed),
        listed = seed % 5 != 0,
        date = date_for(id).format(DATE_FORMAT),
        body = pick(BODIES, seed),
    )
}

/// File name used for an article identity.
#[must_use]
pub fn file_name(id: i64) -> String {
    format!("article-{id}.md")
}

/// Write `count` articles with identities starting at `start_id` into `dir`.
///
/// # Errors
///
/// Fails on a zero count, on identities past `i64::MAX`, or if the
/// directory or any file cannot be written.
pub fn generate_articles(
    dir: &Path,
    count: usize,
    start_id: i64,
) -> Result<Vec<PathBuf>, GenerateError> {
    if count == 0 {
        return Err(GenerateError::EmptyCount);
    }
    let last_id = i64::try_from(count - 1)
        .ok()
        .and_then(|offset| start_id.checked_add(offset))
        .ok_or(GenerateError::IdRange { start_id, count })?;

    std::fs::create_dir_all(dir).map_err(|source| GenerateError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(count);
    for id in start_id..=last_id {
        let path = dir.join(file_name(id));
        std::fs::write(&path, render_article(id)).map_err(|source| GenerateError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    log::debug!("Generated {} articles in {}", written.len(), dir.display());
    Ok(written)
}
