//! Structured error handling and exit codes.

use std::path::PathBuf;

use serde::Serialize;

use crate::content::ContentError;
use crate::scanner::ScanError;
use crate::store::StoreError;

/// Exit codes for mdsync.
///
/// - 0: Success (sync completed without per-file errors)
/// - 1: General error (configuration, store or scan root failure)
/// - 3: Partial success (sync completed but some files or commits failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: all files were processed and committed.
    Success = 0,
    /// General error: the run aborted before or during processing.
    GeneralError = 1,
    /// Partial success: the run finished with `errored > 0`.
    PartialSuccess = 3,
    /// Interrupted: the run was stopped by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "MS000",
            Self::GeneralError => "MS001",
            Self::PartialSuccess => "MS003",
            Self::Interrupted => "MS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Failure processing a single article file. Never aborts a run.
#[derive(thiserror::Error, Debug)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ContentError,
    },

    #[error("failed to walk {}: {0}", .0.path().display())]
    Walk(#[source] ScanError),
}

impl FileError {
    /// Path of the file or directory that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
            Self::Walk(err) => err.path(),
        }
    }
}

/// Errors that abort a sync run before or while it is set up.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// The scan root is missing, unreadable or not a directory.
    #[error("invalid scan root: {0}")]
    Root(#[from] ScanError),

    /// Schema creation or preload failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A pipeline thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A pipeline thread panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
