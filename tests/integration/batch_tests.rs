use mdsync::content::Record;
use mdsync::generate::generate_articles;
use mdsync::store::{SqliteStore, Store, StoreResult, StoredFingerprint};
use mdsync::sync::{BatchConfig, LogSink, Pipeline, SyncConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Records the size of every bulk insert before delegating.
struct RecordingStore {
    inner: SqliteStore,
    batches: Arc<Mutex<Vec<usize>>>,
    upserts: Arc<Mutex<usize>>,
}

impl RecordingStore {
    fn new() -> (Self, Arc<Mutex<Vec<usize>>>, Arc<Mutex<usize>>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let upserts = Arc::new(Mutex::new(0));
        let store = Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            batches: Arc::clone(&batches),
            upserts: Arc::clone(&upserts),
        };
        (store, batches, upserts)
    }
}

impl Store for RecordingStore {
    fn ensure_schema(&mut self) -> StoreResult<()> {
        self.inner.ensure_schema()
    }

    fn load_fingerprints(&self) -> StoreResult<Vec<StoredFingerprint>> {
        self.inner.load_fingerprints()
    }

    fn insert_batch(&mut self, records: &[Record]) -> StoreResult<usize> {
        self.batches.lock().unwrap().push(records.len());
        self.inner.insert_batch(records)
    }

    fn upsert(&mut self, record: &Record) -> StoreResult<()> {
        *self.upserts.lock().unwrap() += 1;
        self.inner.upsert(record)
    }

    fn titles(&self, ids: &[i64]) -> StoreResult<Vec<(i64, String)>> {
        self.inner.titles(ids)
    }

    fn delete_batch(&mut self, ids: &[i64]) -> StoreResult<usize> {
        self.inner.delete_batch(ids)
    }
}

fn size_only(size: usize) -> BatchConfig {
    BatchConfig {
        size,
        interval: Duration::MAX,
    }
}

#[test]
fn test_new_records_are_inserted_in_full_batches() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 137, 1).unwrap();
    let (store, batches, upserts) = RecordingStore::new();

    let config = SyncConfig::new(dir.path())
        .with_workers(4)
        .with_batch(size_only(50));
    let (report, store) = Pipeline::new(config, Arc::new(LogSink))
        .run(store)
        .unwrap();

    assert_eq!(*batches.lock().unwrap(), vec![50, 50, 37]);
    assert_eq!(*upserts.lock().unwrap(), 0);
    assert_eq!(report.commits.bulk_inserts, 3);
    assert_eq!(report.commits.inserted, 137);
    assert_eq!(report.summary.created, 137);
    assert_eq!(store.inner.count().unwrap(), 137);
}

#[test]
fn test_updates_are_written_one_at_a_time() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 10, 1).unwrap();
    let (store, batches, upserts) = RecordingStore::new();

    let config = SyncConfig::new(dir.path())
        .with_workers(2)
        .with_batch(size_only(50));
    let pipeline = Pipeline::new(config, Arc::new(LogSink));
    let (_, store) = pipeline.run(store).unwrap();

    for id in 1..=4 {
        let path = dir.path().join(format!("article-{id}.md"));
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, format!("{text}\nEdited.\n")).unwrap();
    }
    let (report, _) = pipeline.run(store).unwrap();

    assert_eq!(*batches.lock().unwrap(), vec![10]);
    assert_eq!(*upserts.lock().unwrap(), 4);
    assert_eq!(report.summary.updated, 4);
    assert_eq!(report.summary.skipped, 6);
    assert_eq!(report.commits.updated, 4);
    assert_eq!(report.commits.bulk_inserts, 0);
}

#[test]
fn test_batch_of_one_flushes_every_record() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 5, 1).unwrap();
    let (store, batches, _) = RecordingStore::new();

    let config = SyncConfig::new(dir.path())
        .with_workers(1)
        .with_batch(size_only(1));
    let (report, _) = Pipeline::new(config, Arc::new(LogSink))
        .run(store)
        .unwrap();

    assert_eq!(*batches.lock().unwrap(), vec![1; 5]);
    assert_eq!(report.commits.bulk_inserts, 5);
}
