use mdsync::config::Config;
use mdsync::content::fingerprint;
use mdsync::generate::{generate_articles, render_article};
use mdsync::store::{ListQuery, SqliteStore, Store};
use mdsync::sync::{EventSink, LogSink, Pipeline, SyncConfig, SyncReport};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl EventSink for Recorder {
    fn info(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str, err: &dyn Error) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("ERROR {message}: {err}"));
    }
}

fn article(id: i64, title: &str) -> String {
    format!(
        "---\nid: {id}\ntitle: {title}\ntags: [a, b]\nlisted: true\n\
         dateModified: 2024-03-0{day}\n---\nBody {id}\n",
        day = id % 9 + 1
    )
}

fn sync_with(dir: &Path, store: SqliteStore, workers: usize) -> (SyncReport, SqliteStore) {
    Pipeline::new(SyncConfig::new(dir).with_workers(workers), Arc::new(LogSink))
        .run(store)
        .unwrap()
}

fn memory_store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

#[test]
fn test_first_sync_creates_everything() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 12, 1).unwrap();

    let (report, store) = sync_with(dir.path(), memory_store(), 4);

    assert_eq!(report.summary.scanned, 12);
    assert_eq!(report.summary.created, 12);
    assert_eq!(report.summary.updated, 0);
    assert_eq!(report.summary.errored, 0);
    assert!(!report.interrupted);
    assert_eq!(store.count().unwrap(), 12);
}

#[test]
fn test_second_sync_is_idempotent() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 20, 1).unwrap();

    let (_, store) = sync_with(dir.path(), memory_store(), 2);
    let before = store.get_record(5).unwrap().unwrap();
    let (report, store) = sync_with(dir.path(), store, 2);

    assert_eq!(report.summary.skipped, 20);
    assert_eq!(report.summary.created, 0);
    assert_eq!(report.summary.updated, 0);
    assert_eq!(report.summary.deleted, 0);
    assert_eq!(report.commits.flushes, 0);
    assert_eq!(store.get_record(5).unwrap().unwrap(), before);
}

#[test]
fn test_any_byte_change_is_an_update() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("one.md");
    fs::write(&path, article(1, "First")).unwrap();

    let (_, store) = sync_with(dir.path(), memory_store(), 1);
    let created_at = store.get_record(1).unwrap().unwrap().created_at;

    // Trailing whitespace only; the parsed record is identical
    fs::write(&path, format!("{}\n", article(1, "First"))).unwrap();
    let (report, store) = sync_with(dir.path(), store, 1);

    assert_eq!(report.summary.updated, 1);
    let record = store.get_record(1).unwrap().unwrap();
    assert_eq!(record.created_at, created_at);
    assert_eq!(
        record.fingerprint,
        fingerprint(format!("{}\n", article(1, "First")).as_bytes())
    );
}

#[test]
fn test_removed_file_is_deleted() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 5, 1).unwrap();
    let (_, store) = sync_with(dir.path(), memory_store(), 2);

    fs::remove_file(dir.path().join("article-3.md")).unwrap();
    let sink = Arc::new(Recorder::default());
    let config = SyncConfig::new(dir.path()).with_workers(2);
    let (report, store) = Pipeline::new(config, sink.clone())
        .run(store)
        .unwrap();

    assert_eq!(report.summary.deleted, 1);
    assert_eq!(report.summary.skipped, 4);
    assert!(store.get_record(3).unwrap().is_none());
    assert_eq!(store.count().unwrap(), 4);
    assert!(sink.contains("Deleted: id=3, title=\"Sample Article 3: "));
}

#[test]
fn test_malformed_file_does_not_stop_the_run() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 4, 1).unwrap();
    fs::write(dir.path().join("broken.md"), "no front matter").unwrap();
    fs::write(
        dir.path().join("bad-date.md"),
        "---\nid: 99\ndateModified: 03/04/2024\n---\n",
    )
    .unwrap();

    let sink = Arc::new(Recorder::default());
    let config = SyncConfig::new(dir.path()).with_workers(3);
    let (report, store) = Pipeline::new(config, sink.clone())
        .run(memory_store())
        .unwrap();

    assert_eq!(report.summary.scanned, 6);
    assert_eq!(report.summary.created, 4);
    assert_eq!(report.summary.errored, 2);
    assert!(report.summary.has_errors());
    assert_eq!(store.count().unwrap(), 4);
    assert!(sink.contains("broken.md"));
    assert!(sink.contains("bad-date.md"));
}

#[test]
fn test_unparseable_file_leaves_its_record_orphaned() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("one.md");
    fs::write(&path, article(1, "First")).unwrap();
    let (_, store) = sync_with(dir.path(), memory_store(), 1);

    // The identity can no longer be read, so the record counts as orphaned
    fs::write(&path, "---\nid: [\n---\n").unwrap();
    let (report, store) = sync_with(dir.path(), store, 1);

    assert_eq!(report.summary.errored, 1);
    assert_eq!(report.summary.deleted, 1);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_worker_count_does_not_change_the_result() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 60, 1).unwrap();

    let (single, one) = sync_with(dir.path(), memory_store(), 1);
    let (many, four) = sync_with(dir.path(), memory_store(), 4);

    assert_eq!(single.summary.created, many.summary.created);
    let query = ListQuery {
        per_page: 100,
        ..ListQuery::default()
    };
    let ids = |store: &SqliteStore| -> Vec<i64> {
        store
            .list_records(&query)
            .unwrap()
            .items
            .into_iter()
            .map(|s| s.id)
            .collect()
    };
    assert_eq!(ids(&one), ids(&four));
    for id in [1, 30, 60] {
        let a = one.get_record(id).unwrap().unwrap();
        let b = four.get_record(id).unwrap().unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.content, b.content);
        assert_eq!(a.tags, b.tags);
    }
}

#[test]
fn test_duplicate_identity_keeps_one_record() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.md"), article(7, "From A")).unwrap();
    fs::write(dir.path().join("b.md"), article(7, "From B")).unwrap();

    let sink = Arc::new(Recorder::default());
    let config = SyncConfig::new(dir.path()).with_workers(1);
    let (report, store) = Pipeline::new(config, sink.clone())
        .run(memory_store())
        .unwrap();

    assert_eq!(report.summary.scanned, 2);
    assert_eq!(store.count().unwrap(), 1);
    assert!(sink.contains("Duplicate id=7"));
    let title = store.get_record(7).unwrap().unwrap().title;
    assert!(title == "From A" || title == "From B");
}

#[test]
fn test_interrupted_run_skips_orphan_cleanup() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 3, 1).unwrap();
    let (_, store) = sync_with(dir.path(), memory_store(), 1);
    fs::remove_file(dir.path().join("article-1.md")).unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let config = SyncConfig::new(dir.path()).with_workers(2);
    let (report, store) = Pipeline::new(config, Arc::new(LogSink))
        .with_shutdown_flag(flag)
        .run(store)
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.summary.deleted, 0);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_missing_root_fails_before_processing() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(dir.path().join("missing"));
    let result = Pipeline::new(config, Arc::new(LogSink)).run(memory_store());
    assert!(result.is_err());
}

#[test]
fn test_file_backed_store_persists_between_runs() {
    let dir = tempdir().unwrap();
    let articles = dir.path().join("articles");
    generate_articles(&articles, 8, 100).unwrap();
    let db = dir.path().join("data").join("mdsync.db");

    let open = || SqliteStore::open(&db, std::time::Duration::from_secs(5)).unwrap();
    let (first, _) = sync_with(&articles, open(), 2);
    let (second, _) = sync_with(&articles, open(), 2);

    assert_eq!(first.summary.created, 8);
    assert_eq!(second.summary.skipped, 8);
    assert!(db.exists());
}

#[test]
fn test_listing_after_sync() {
    let dir = tempdir().unwrap();
    generate_articles(dir.path(), 25, 1).unwrap();
    let (_, store) = sync_with(dir.path(), memory_store(), 3);

    let page = store
        .list_records(&ListQuery {
            page: 3,
            per_page: 10,
            ..ListQuery::default()
        })
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages(), 3);
    assert_eq!(page.items.len(), 5);

    let tags = store.tags().unwrap();
    assert!(!tags.is_empty());
    let tag = tags.iter().next().unwrap().clone();
    let tagged = store
        .list_records(&ListQuery {
            per_page: 100,
            tag: Some(tag.clone()),
            ..ListQuery::default()
        })
        .unwrap();
    assert!(tagged.total > 0);
    assert!(tagged.items.iter().all(|s| s.tags.contains(&tag)));

    let record = store.get_record(10).unwrap().unwrap();
    assert_eq!(
        record.fingerprint,
        fingerprint(render_article(10).as_bytes())
    );
}

#[test]
fn test_schema_is_created_on_first_run() {
    let dir = tempdir().unwrap();
    let mut store = memory_store();
    store.ensure_schema().unwrap();
    assert!(store.load_fingerprints().unwrap().is_empty());

    let (report, _) = sync_with(dir.path(), store, 1);
    assert_eq!(report.summary.scanned, 0);
}

#[test]
fn test_default_config_syncs_every_markdown_file() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".notes")).unwrap();
    fs::create_dir(dir.path().join("drafts")).unwrap();
    fs::write(dir.path().join(".notes").join("a.md"), article(1, "Hidden")).unwrap();
    fs::write(dir.path().join("drafts").join("b.md"), article(2, "Draft")).unwrap();

    let mut config = Config::default();
    config.scan.dir = dir.path().to_path_buf();
    let pipeline = Pipeline::new(config.sync_config(), Arc::new(LogSink));

    let (first, store) = pipeline.run(memory_store()).unwrap();
    assert_eq!(first.summary.scanned, 2);
    assert_eq!(first.summary.created, 2);

    // An unrelated .gitignore must not make live records look orphaned
    fs::write(dir.path().join(".gitignore"), "drafts/\n").unwrap();
    let (second, store) = pipeline.run(store).unwrap();
    assert_eq!(second.summary.scanned, 2);
    assert_eq!(second.summary.skipped, 2);
    assert_eq!(second.summary.deleted, 0);
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_gitignore_is_honored_when_enabled() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("drafts")).unwrap();
    fs::write(dir.path().join("a.md"), article(1, "Live")).unwrap();
    fs::write(dir.path().join("drafts").join("b.md"), article(2, "Draft")).unwrap();
    fs::write(dir.path().join(".gitignore"), "drafts/\n").unwrap();

    let mut config = Config::default();
    config.scan.dir = dir.path().to_path_buf();
    config.scan.respect_gitignore = true;
    let pipeline = Pipeline::new(config.sync_config(), Arc::new(LogSink));

    let (report, store) = pipeline.run(memory_store()).unwrap();
    assert_eq!(report.summary.scanned, 1);
    assert!(store.get_record(2).unwrap().is_none());
}
