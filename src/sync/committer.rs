//! Batch committer.
//!
//! A single thread owns the store while the pipeline runs. It buffers
//! operations and flushes when either buffer reaches the batch size or the
//! flush interval has passed since the last flush, then performs a final
//! flush once the operation queue closes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};
use serde::Serialize;

use super::{EventSink, Operation, OperationKind, SyncStats};
use crate::content::Record;
use crate::store::Store;

/// Default number of buffered records that triggers a flush.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default time between flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Flush triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Flush when either pending buffer holds this many records
    pub size: usize,
    /// Flush when this much time has passed since the last flush; zero
    /// disables the time trigger
    pub interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// What the committer did during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitStats {
    /// Flushes that had at least one pending record
    pub flushes: u64,
    /// Bulk insert calls made against the store
    pub bulk_inserts: u64,
    /// Records written by successful bulk inserts
    pub inserted: u64,
    /// Records written by successful single upserts
    pub updated: u64,
    /// Records whose write failed
    pub failed: u64,
}

/// Owns the store and the pending buffers for one run.
pub struct Committer<S: Store> {
    store: S,
    config: BatchConfig,
    pending_new: Vec<Record>,
    pending_update: Vec<Record>,
    stats: Arc<SyncStats>,
    sink: Arc<dyn EventSink>,
    commits: CommitStats,
}

impl<S: Store> Committer<S> {
    /// A zero batch size is treated as one.
    pub fn new(
        store: S,
        config: BatchConfig,
        stats: Arc<SyncStats>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let config = BatchConfig {
            size: config.size.max(1),
            ..config
        };
        Self {
            store,
            pending_new: Vec::with_capacity(config.size),
            pending_update: Vec::with_capacity(config.size),
            config,
            stats,
            sink,
            commits: CommitStats::default(),
        }
    }

    /// Consume operations until the queue is closed, then hand the store
    /// back.
    pub fn run(mut self, ops: &Receiver<Operation>) -> (S, CommitStats) {
        let mut last_flush = Instant::now();

        loop {
            // A zero interval, or one too large to represent, never fires
            let timer = Some(self.config.interval)
                .filter(|interval| !interval.is_zero())
                .and_then(|interval| last_flush.checked_add(interval))
                .map_or_else(crossbeam_channel::never, crossbeam_channel::at);

            select! {
                recv(ops) -> msg => match msg {
                    Ok(op) => {
                        self.push(op);
                        if self.is_full() {
                            self.flush();
                            last_flush = Instant::now();
                        }
                    }
                    Err(_) => break,
                },
                recv(timer) -> _ => {
                    self.flush();
                    last_flush = Instant::now();
                }
            }
        }

        self.flush();
        log::debug!("Committer finished: {:?}", self.commits);
        (self.store, self.commits)
    }

    fn push(&mut self, op: Operation) {
        match op.kind {
            OperationKind::New => self.pending_new.push(op.record),
            OperationKind::Update => self.pending_update.push(op.record),
        }
    }

    fn is_full(&self) -> bool {
        self.pending_new.len() >= self.config.size || self.pending_update.len() >= self.config.size
    }

    /// Write both buffers. Failures are reported and the buffers cleared.
    fn flush(&mut self) {
        if self.pending_new.is_empty() && self.pending_update.is_empty() {
            return;
        }
        self.commits.flushes += 1;

        let new = std::mem::take(&mut self.pending_new);
        if !new.is_empty() {
            self.commits.bulk_inserts += 1;
            match self.store.insert_batch(&new) {
                Ok(written) => {
                    log::debug!("Inserted {} records", written);
                    self.commits.inserted += written as u64;
                }
                Err(e) => {
                    self.sink.error(
                        &format!("Failed to insert batch of {} records", new.len()),
                        &e,
                    );
                    self.stats.add_errored(new.len() as u64);
                    self.commits.failed += new.len() as u64;
                }
            }
        }

        for record in std::mem::take(&mut self.pending_update) {
            match self.store.upsert(&record) {
                Ok(()) => self.commits.updated += 1,
                Err(e) => {
                    self.sink.error(
                        &format!(
                            "Failed to update record id={}, title=\"{}\"",
                            record.id, record.title
                        ),
                        &e,
                    );
                    self.stats.add_errored(1);
                    self.commits.failed += 1;
                }
            }
        }
    }
}
