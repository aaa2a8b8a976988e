//! mdsync - Markdown article synchronizer
//!
//! Scans a tree of Markdown files with YAML front matter and reconciles a
//! SQLite table with it: new files are inserted in batches, changed files
//! are updated, unchanged files are skipped by BLAKE3 fingerprint, and
//! records whose files disappeared are deleted.

pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod generate;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod store;
pub mod sync;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{
    Cli, Commands, GenerateArgs, InitConfigArgs, ListArgs, OutputFormat, ShowArgs, SyncArgs,
};
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::store::{ListQuery, SqliteStore, Store};
use crate::sync::{LogSink, Pipeline, SyncReport};

/// Run the parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error for anything that aborts the command: unreadable
/// configuration, a store that cannot be opened, an unusable scan root.
/// Per-file failures during a sync are reported through the exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        config,
        command,
        ..
    } = cli;
    logging::init_logging(verbose, quiet);
    log::debug!("Log level: {}", logging::current_level_name());

    let config_path = config.as_deref();
    match command {
        Commands::Sync(args) => run_sync(config_path, &args, quiet),
        Commands::InitConfig(args) => run_init_config(&args),
        Commands::Generate(args) => run_generate(&args, quiet),
        Commands::List(args) => run_list(config_path, &args),
        Commands::Show(args) => run_show(config_path, &args),
    }
}

/// Exit code for a finished sync.
#[must_use]
pub fn exit_code_for(report: &SyncReport) -> ExitCode {
    if report.interrupted {
        ExitCode::Interrupted
    } else if report.summary.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_sync(config_path: Option<&Path>, args: &SyncArgs, quiet: bool) -> Result<ExitCode> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    config.apply_sync_args(args);
    config.validate()?;

    let handler = signal::install_handler()?;
    let store = SqliteStore::open(&config.database.path, config.busy_timeout())?;

    let mut pipeline = Pipeline::new(config.sync_config(), Arc::new(LogSink))
        .with_shutdown_flag(handler.get_flag());
    if !quiet && !args.no_progress {
        pipeline = pipeline.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let (report, _store) = pipeline
        .run(store)
        .with_context(|| format!("Sync of {} failed", config.scan.dir.display()))?;
    let exit_code = exit_code_for(&report);

    let stdout = std::io::stdout();
    match args.output {
        OutputFormat::Json => {
            output::JsonSyncOutput::new(&report, exit_code).write_to(stdout.lock())?;
        }
        OutputFormat::Text if !quiet => output::write_summary(stdout.lock(), &report)?,
        OutputFormat::Text => {}
    }

    Ok(exit_code)
}

fn run_init_config(args: &InitConfigArgs) -> Result<ExitCode> {
    Config::write_default(&args.output, args.force)?;
    println!("Wrote default configuration to {}", args.output.display());
    Ok(ExitCode::Success)
}

fn run_generate(args: &GenerateArgs, quiet: bool) -> Result<ExitCode> {
    let written = generate::generate_articles(&args.output, args.count, args.start_id)?;
    if !quiet {
        println!(
            "Generated {} markdown files in {}",
            written.len(),
            args.output.display()
        );
    }
    Ok(ExitCode::Success)
}

/// Open an existing database for reading.
fn open_existing(config_path: Option<&Path>, db: Option<&Path>) -> Result<SqliteStore> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let path = db.unwrap_or(config.database.path.as_path());
    if !path.exists() {
        bail!(
            "Database {} does not exist; run `mdsync sync` first",
            path.display()
        );
    }
    let mut store = SqliteStore::open(path, config.busy_timeout())?;
    store.ensure_schema()?;
    Ok(store)
}

fn run_list(config_path: Option<&Path>, args: &ListArgs) -> Result<ExitCode> {
    let store = open_existing(config_path, args.db.as_deref())?;
    let page = store.list_records(&ListQuery {
        page: args.page,
        per_page: args.per_page,
        tag: args.tag.clone(),
        listed_only: args.listed,
    })?;

    let mut stdout = std::io::stdout().lock();
    match args.output {
        OutputFormat::Json => output::json::write_page(&mut stdout, &page)?,
        OutputFormat::Text => output::write_page(&mut stdout, &page)?,
    }
    stdout.flush()?;
    Ok(ExitCode::Success)
}

fn run_show(config_path: Option<&Path>, args: &ShowArgs) -> Result<ExitCode> {
    let store = open_existing(config_path, args.db.as_deref())?;
    let Some(record) = store.get_record(args.id)? else {
        bail!("No article with id {}", args.id);
    };

    let mut stdout = std::io::stdout().lock();
    match args.output {
        OutputFormat::Json => output::json::write_record(&mut stdout, &record)?,
        OutputFormat::Text => output::write_record(&mut stdout, &record)?,
    }
    stdout.flush()?;
    Ok(ExitCode::Success)
}
