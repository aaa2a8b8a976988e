//! JSON output formatter.
//!
//! # Sync summary schema
//!
//! ```json
//! {
//!   "summary": {
//!     "scanned": 137,
//!     "created": 2,
//!     "updated": 1,
//!     "deleted": 0,
//!     "skipped": 134,
//!     "errored": 0,
//!     "elapsed_ms": 412
//!   },
//!   "commits": {
//!     "flushes": 1,
//!     "bulk_inserts": 1,
//!     "inserted": 2,
//!     "updated": 1,
//!     "failed": 0
//!   },
//!   "interrupted": false,
//!   "exit_code": 0,
//!   "exit_code_name": "MS000"
//! }
//! ```
//!
//! Listings and single articles serialize [`RecordPage`] and [`Record`]
//! directly.

use std::io::Write;

use serde::Serialize;

use crate::content::Record;
use crate::error::ExitCode;
use crate::store::RecordPage;
use crate::sync::{CommitStats, SyncReport, SyncSummary};

/// Complete JSON document for one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSyncOutput {
    pub summary: SyncSummary,
    pub commits: CommitStats,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "MS000")
    pub exit_code_name: String,
}

impl JsonSyncOutput {
    #[must_use]
    pub fn new(report: &SyncReport, exit_code: ExitCode) -> Self {
        Self {
            summary: report.summary,
            commits: report.commits,
            interrupted: report.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Write a listing page as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_page<W: Write>(mut writer: W, page: &RecordPage) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, page)?;
    writeln!(writer)?;
    Ok(())
}

/// Write one article as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_record<W: Write>(mut writer: W, record: &Record) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer)?;
    Ok(())
}
