//! Human-readable output.

use std::io::{self, Write};

use crate::content::{Record, DATE_FORMAT};
use crate::store::RecordPage;
use crate::sync::SyncReport;

/// Write the end-of-run statistics block.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_summary<W: Write>(mut w: W, report: &SyncReport) -> io::Result<()> {
    let s = &report.summary;
    if report.interrupted {
        writeln!(w, "Sync interrupted; orphaned records were not deleted.")?;
    } else if s.has_errors() {
        writeln!(w, "Sync completed with errors.")?;
    } else {
        writeln!(w, "Sync completed successfully!")?;
    }
    writeln!(w, "Statistics:")?;
    writeln!(w, "- Files scanned: {}", s.scanned)?;
    writeln!(w, "- New articles: {}", s.created)?;
    writeln!(w, "- Updated articles: {}", s.updated)?;
    writeln!(w, "- Deleted articles: {}", s.deleted)?;
    writeln!(w, "- Skipped (no changes): {}", s.skipped)?;
    writeln!(w, "- Errors: {}", s.errored)?;
    writeln!(w, "- Total execution time: {:.3?}", s.elapsed())?;
    Ok(())
}

/// Write one line per article plus a page footer.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_page<W: Write>(mut w: W, page: &RecordPage) -> io::Result<()> {
    if page.items.is_empty() {
        writeln!(w, "No articles found.")?;
    }
    for item in &page.items {
        let marker = if item.listed { ' ' } else { '*' };
        writeln!(
            w,
            "{:>6}{} {}  {}  [{}]",
            item.id,
            marker,
            item.date_modified.format(DATE_FORMAT),
            item.title,
            item.tags.join(", ")
        )?;
    }
    writeln!(
        w,
        "Page {} of {} ({} articles)",
        page.page,
        page.total_pages().max(1),
        page.total
    )?;
    Ok(())
}

/// Write one article with its metadata header and body.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_record<W: Write>(mut w: W, record: &Record) -> io::Result<()> {
    writeln!(w, "id:            {}", record.id)?;
    writeln!(w, "title:         {}", record.title)?;
    writeln!(w, "tags:          {}", record.tags.join(", "))?;
    writeln!(w, "cover:         {}", record.cover)?;
    writeln!(w, "excerpt:       {}", record.excerpt)?;
    writeln!(w, "listed:        {}", record.listed)?;
    writeln!(
        w,
        "date modified: {}",
        record.date_modified.format(DATE_FORMAT)
    )?;
    writeln!(w, "fingerprint:   {}", record.fingerprint)?;
    writeln!(w, "created at:    {}", record.created_at.to_rfc3339())?;
    writeln!(w, "updated at:    {}", record.updated_at.to_rfc3339())?;
    writeln!(w)?;
    writeln!(w, "{}", record.content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordSummary;
    use crate::sync::{CommitStats, SyncSummary};
    use chrono::{NaiveDate, Utc};

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_lists_every_counter() {
        let report = SyncReport {
            summary: SyncSummary {
                scanned: 10,
                created: 2,
                updated: 3,
                deleted: 1,
                skipped: 4,
                errored: 1,
                elapsed_ms: 250,
            },
            commits: CommitStats::default(),
            interrupted: false,
        };

        let text = render(|buf| write_summary(buf, &report));
        assert!(text.starts_with("Sync completed with errors."));
        assert!(text.contains("- Files scanned: 10"));
        assert!(text.contains("- Skipped (no changes): 4"));
        assert!(text.contains("- Errors: 1"));
    }

    #[test]
    fn test_page_marks_unlisted() {
        let page = RecordPage {
            items: vec![RecordSummary {
                id: 5,
                title: "Hidden".to_string(),
                tags: vec!["a".to_string(), "b".to_string()],
                cover: String::new(),
                excerpt: String::new(),
                listed: false,
                date_modified: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                updated_at: Utc::now(),
            }],
            total: 11,
            page: 2,
            per_page: 10,
        };

        let text = render(|buf| write_page(buf, &page));
        assert!(text.contains("     5* 2024-02-29  Hidden  [a, b]"));
        assert!(text.contains("Page 2 of 2 (11 articles)"));
    }

    #[test]
    fn test_empty_page() {
        let page = RecordPage {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        };
        let text = render(|buf| write_page(buf, &page));
        assert!(text.contains("No articles found."));
        assert!(text.contains("Page 1 of 1 (0 articles)"));
    }
}
