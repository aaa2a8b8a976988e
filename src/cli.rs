//! Command-line interface definitions for mdsync.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API. Global options (verbosity, config file, JSON errors)
//! apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Sync ./articles into ./mdsync.db
//! mdsync sync
//!
//! # Sync another tree with 8 workers and print the summary as JSON
//! mdsync sync --dir ~/blog/posts --workers 8 --output json
//!
//! # Page through what is stored
//! mdsync list --tag rust --page 2
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Synchronize a tree of Markdown articles into a SQLite database.
///
/// Each article declares its identity and metadata in a YAML front matter
/// block. Only new or changed files are written, and records whose files
/// disappeared are deleted.
#[derive(Debug, Parser)]
#[command(name = "mdsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: ./mdsync.toml, then the platform config dir)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the article directory into the database
    Sync(SyncArgs),
    /// Write a default configuration file
    InitConfig(InitConfigArgs),
    /// Write sample articles for trying out or benchmarking a sync
    Generate(GenerateArgs),
    /// List stored articles, newest first
    List(ListArgs),
    /// Show one stored article
    Show(ShowArgs),
}

/// Arguments for the sync subcommand.
#[derive(Debug, Default, Args)]
pub struct SyncArgs {
    /// Directory containing the articles
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Number of worker threads (0 = one per logical CPU)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Records buffered before a flush
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Milliseconds between time-triggered flushes
    #[arg(long, value_name = "MS")]
    pub batch_interval_ms: Option<u64>,

    /// Glob patterns to exclude (can be specified multiple times)
    ///
    /// These patterns are added to the configured ones and to a .gitignore
    /// at the root of the tree.
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the init-config subcommand.
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Where to write the file
    #[arg(short, long, value_name = "PATH", default_value = "mdsync.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the generate subcommand.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of articles to write
    #[arg(short = 'n', long, default_value = "100")]
    pub count: usize,

    /// Directory to write into (created if missing)
    #[arg(short, long, value_name = "DIR", default_value = "articles")]
    pub output: PathBuf,

    /// Identity of the first article
    #[arg(long, default_value = "1")]
    pub start_id: i64,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Articles per page
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
    pub per_page: u32,

    /// Only articles with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only articles marked as listed
    #[arg(long)]
    pub listed: bool,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Article identity
    #[arg(value_name = "ID", allow_negative_numbers = true)]
    pub id: i64,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
