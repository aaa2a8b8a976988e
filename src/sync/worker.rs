//! Per-file processing and the worker loop.
//!
//! A worker reads a file, fingerprints the raw bytes, parses it and
//! classifies it against the [`ChangeCache`]. New and changed files become
//! [`Operation`]s for the committer; unchanged files produce nothing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};

use super::{EventSink, SyncStats};
use crate::cache::{Change, ChangeCache};
use crate::content::{fingerprint, parse_record, Record};
use crate::error::FileError;
use crate::progress::ProgressCallback;
use crate::scanner::Task;

/// Whether an operation creates or replaces a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    New,
    Update,
}

/// A record to be written by the committer.
#[derive(Debug, Clone)]
pub struct Operation {
    pub record: Record,
    pub kind: OperationKind,
}

/// Process one task.
///
/// The cache entry for the file's identity is confirmed before this
/// returns, whatever the outcome of the classification. Returns `None`
/// when the file is unchanged.
///
/// # Errors
///
/// Returns [`FileError`] when the file cannot be read or parsed. The cache
/// is left untouched in that case.
pub fn process_task(
    task: &Task,
    cache: &ChangeCache,
    sink: &dyn EventSink,
    now: DateTime<Utc>,
) -> Result<Option<Operation>, FileError> {
    let bytes = std::fs::read(&task.path).map_err(|source| FileError::Read {
        path: task.rel_path.clone(),
        source,
    })?;

    let fingerprint = fingerprint(&bytes);
    let mut record = parse_record(&bytes).map_err(|source| FileError::Parse {
        path: task.rel_path.clone(),
        source,
    })?;

    let classification = cache.classify(record.id, &fingerprint, now);
    if classification.duplicate {
        sink.warn(&format!(
            "Duplicate id={} in {}; the last processed file wins",
            record.id,
            task.rel_path.display()
        ));
    }

    let kind = match classification.change {
        Change::Unchanged => return Ok(None),
        Change::New => OperationKind::New,
        Change::Updated => OperationKind::Update,
    };

    record.fingerprint = fingerprint;
    record.created_at = classification.created_at;
    record.updated_at = now;
    Ok(Some(Operation { record, kind }))
}

/// Shared state every worker of a run needs.
pub(crate) struct WorkerContext {
    pub cache: Arc<ChangeCache>,
    pub stats: Arc<SyncStats>,
    pub sink: Arc<dyn EventSink>,
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    pub progress: Option<Arc<dyn ProgressCallback>>,
    pub processed: Arc<AtomicUsize>,
}

impl WorkerContext {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Consume tasks until the queue is closed and drained or shutdown is
/// requested.
pub(crate) fn run_worker(
    ctx: &WorkerContext,
    tasks: &Receiver<Task>,
    ops: &Sender<Operation>,
    errors: &Sender<FileError>,
) {
    for task in tasks.iter() {
        if ctx.is_shutdown_requested() {
            log::debug!("Worker: Shutdown requested, stopping");
            break;
        }

        ctx.stats.add_scanned(1);
        match process_task(&task, &ctx.cache, ctx.sink.as_ref(), Utc::now()) {
            Ok(Some(op)) => {
                let verb = match op.kind {
                    OperationKind::New => {
                        ctx.stats.add_created(1);
                        "Created"
                    }
                    OperationKind::Update => {
                        ctx.stats.add_updated(1);
                        "Updated"
                    }
                };
                ctx.sink.info(&format!("{verb}: {}", task.rel_path.display()));
                if ops.send(op).is_err() {
                    log::warn!("Committer stopped; worker exiting early");
                    break;
                }
            }
            Ok(None) => {
                log::trace!("Unchanged: {}", task.rel_path.display());
                ctx.stats.add_skipped(1);
            }
            Err(err) => {
                ctx.stats.add_errored(1);
                // The receiver lives on the coordinating thread until every
                // worker has been joined.
                let _ = errors.send(err);
            }
        }

        let done = ctx.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = &ctx.progress {
            progress.on_progress(done, &task.rel_path.to_string_lossy());
        }
    }
}
