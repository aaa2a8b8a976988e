//! Scanner module for discovering article files.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Filtering to Markdown (`*.md`) files
//! - Gitignore-style exclusion patterns
//!
//! # Example
//!
//! ```no_run
//! use mdsync::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("articles"), WalkerConfig::default());
//! for task in walker.walk() {
//!     match task {
//!         Ok(task) => println!("{} ({} bytes)", task.rel_path.display(), task.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

pub use walker::{Walker, ARTICLE_EXTENSION};

/// One eligible file discovered under the scan root.
///
/// Size and mtime are informational only; change detection never looks
/// at them.
#[derive(Debug, Clone)]
pub struct Task {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Path relative to the scan root
    pub rel_path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl Task {
    /// Create a new Task.
    #[must_use]
    pub fn new(path: PathBuf, rel_path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            rel_path,
            size,
            modified,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Also exclude whatever a `.gitignore` at the root ignores.
    pub respect_gitignore: bool,

    /// Glob patterns to exclude (gitignore-style).
    pub exclude_patterns: Vec<String>,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) | Self::NotADirectory(path) => {
                path
            }
            Self::Io { path, .. } => path,
        }
    }
}
