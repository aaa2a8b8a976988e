//! Directory-to-store synchronization pipeline.
//!
//! # Threads
//!
//! ```text
//! walker ──tasks(100)──▶ worker × W ──ops(100)──▶ committer ──▶ store
//!    │                       │
//!    └──────── errors (unbounded) ────────▶ coordinator ──▶ reaper
//! ```
//!
//! The coordinator (the thread calling [`Pipeline::run`]) joins the walker,
//! then the workers, closes the operation queue, joins the committer to
//! get the store back, drains the error queue and finally runs the reaper.
//!
//! * [`worker`]: per-file read, fingerprint, parse and classify.
//! * [`committer`]: batched writes on a single thread.
//! * [`reaper`]: deletion of records whose files disappeared.
//! * [`stats`]: run-wide atomic counters.
//! * [`sink`]: where status lines go.

pub mod committer;
pub mod reaper;
pub mod sink;
pub mod stats;
pub mod worker;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::bounded;
use serde::Serialize;

use crate::cache::ChangeCache;
use crate::error::{FileError, SyncError};
use crate::progress::ProgressCallback;
use crate::scanner::{ScanError, Task, Walker, WalkerConfig};
use crate::store::Store;

pub use committer::{BatchConfig, CommitStats, Committer};
pub use reaper::reap;
pub use sink::{EventSink, LogSink};
pub use stats::{SyncStats, SyncSummary};
pub use worker::{process_task, Operation, OperationKind};

use worker::{run_worker, WorkerContext};

/// Capacity of the task and operation queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory tree to scan
    pub root: PathBuf,
    /// Worker threads; 0 means one per logical CPU
    pub workers: usize,
    pub batch: BatchConfig,
    pub walker: WalkerConfig,
    /// Capacity of the task and operation queues
    pub queue_capacity: usize,
    /// Stack size for worker threads; `None` uses the platform default
    pub worker_stack_size: Option<usize>,
}

impl SyncConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: 0,
            batch: BatchConfig::default(),
            walker: WalkerConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_stack_size: None,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    #[must_use]
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    /// Worker count after resolving 0 to the number of logical CPUs.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub summary: SyncSummary,
    pub commits: CommitStats,
    /// Shutdown was requested before the run finished; no orphans were
    /// deleted.
    pub interrupted: bool,
}

/// A configured sync run.
pub struct Pipeline {
    config: SyncConfig,
    sink: Arc<dyn EventSink>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(config: SyncConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once set, the walker and workers stop taking new work. Operations
    /// already queued are still committed.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set a callback for per-file progress.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Synchronize the configured directory into `store`.
    ///
    /// The store is handed back together with the report.
    ///
    /// # Errors
    ///
    /// Fails before any file is processed if the scan root is unusable or
    /// the schema or fingerprints cannot be loaded, and after processing if
    /// a pipeline thread could not be spawned or panicked. Threads already
    /// running are joined before a spawn failure is returned. Per-file and
    /// per-commit failures are counted in the report instead.
    pub fn run<S: Store + 'static>(&self, mut store: S) -> Result<(SyncReport, S), SyncError> {
        let start = Instant::now();
        let root = resolve_root(&self.config.root)?;
        let workers = self.config.effective_workers();

        store.ensure_schema()?;
        let cache = Arc::new(ChangeCache::preload(store.load_fingerprints()?));
        let stats = Arc::new(SyncStats::new());
        self.sink.info(&format!(
            "Syncing {} with {} workers ({} known articles)",
            root.display(),
            workers,
            cache.len()
        ));

        if let Some(progress) = &self.progress {
            progress.on_phase_start("sync", 0);
        }

        let capacity = self.config.queue_capacity.max(1);
        let (task_tx, task_rx) = bounded::<Task>(capacity);
        let (op_tx, op_rx) = bounded::<Operation>(capacity);
        let (err_tx, err_rx) = crossbeam_channel::unbounded::<FileError>();

        // The committer starts first so a later spawn failure can still close
        // the operation queue and join it.
        let committer_handle = {
            let committer = Committer::new(
                store,
                self.config.batch,
                Arc::clone(&stats),
                Arc::clone(&self.sink),
            );
            spawn("committer", None, move || committer.run(&op_rx))?
        };

        let walker_handle = {
            let mut walker = Walker::new(&root, self.config.walker.clone());
            if let Some(flag) = &self.shutdown_flag {
                walker = walker.with_shutdown_flag(Arc::clone(flag));
            }
            let stats = Arc::clone(&stats);
            let err_tx = err_tx.clone();
            spawn("walker", None, move || {
                for item in walker.walk() {
                    match item {
                        Ok(task) => {
                            if task_tx.send(task).is_err() {
                                log::debug!("All workers gone; walker stopping");
                                break;
                            }
                        }
                        Err(e) => {
                            stats.add_errored(1);
                            let _ = err_tx.send(FileError::Walk(e));
                        }
                    }
                }
            })
        };
        let walker_handle = match walker_handle {
            Ok(handle) => handle,
            Err(e) => {
                drop(op_tx);
                let _ = committer_handle.join();
                return Err(e);
            }
        };

        let ctx = Arc::new(WorkerContext {
            cache: Arc::clone(&cache),
            stats: Arc::clone(&stats),
            sink: Arc::clone(&self.sink),
            shutdown_flag: self.shutdown_flag.clone(),
            progress: self.progress.clone(),
            processed: Arc::new(AtomicUsize::new(0)),
        });
        let mut spawn_error = None;
        let mut worker_handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let ctx = Arc::clone(&ctx);
            let tasks = task_rx.clone();
            let ops = op_tx.clone();
            let errors = err_tx.clone();
            let spawned = spawn("worker", self.config.worker_stack_size, move || {
                run_worker(&ctx, &tasks, &ops, &errors);
            });
            match spawned {
                Ok(handle) => worker_handles.push(handle),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        // Only workers hold the task receiver now, so the walker notices
        // when they all stop early.
        drop(task_rx);
        drop(err_tx);

        let mut panicked = None;
        if walker_handle.join().is_err() {
            panicked = Some("walker");
        }
        for handle in worker_handles {
            if handle.join().is_err() {
                panicked = Some("worker");
            }
        }

        // Closing the operation queue lets the committer do its final flush
        drop(op_tx);
        let (mut store, commits) = committer_handle
            .join()
            .map_err(|_| SyncError::ThreadPanicked("committer"))?;

        for err in err_rx.try_iter() {
            self.sink.error(
                &format!("Failed to process {}", err.path().display()),
                &err,
            );
        }

        if let Some(progress) = &self.progress {
            progress.on_phase_end("sync");
        }

        if let Some(err) = spawn_error {
            return Err(err);
        }
        if let Some(name) = panicked {
            return Err(SyncError::ThreadPanicked(name));
        }

        let interrupted = self.is_shutdown_requested();
        if interrupted {
            self.sink
                .warn("Interrupted before all files were seen; skipping orphan cleanup");
        } else {
            reap(&mut store, &cache, &stats, self.sink.as_ref());
        }

        let report = SyncReport {
            summary: stats.snapshot(start.elapsed()),
            commits,
            interrupted,
        };
        Ok((report, store))
    }
}

fn spawn<T, F>(
    name: &'static str,
    stack_size: Option<usize>,
    f: F,
) -> Result<JoinHandle<T>, SyncError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let mut builder = thread::Builder::new().name(format!("mdsync-{name}"));
    if let Some(bytes) = stack_size {
        builder = builder.stack_size(bytes);
    }
    builder
        .spawn(f)
        .map_err(|source| SyncError::Spawn { name, source })
}

/// Canonicalize the scan root and make sure it is a readable directory.
fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let to_scan_error = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    };

    let canonical = root.canonicalize().map_err(to_scan_error)?;
    if !canonical.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(&canonical).map_err(to_scan_error)?;
    Ok(canonical)
}
