//! Orphan deletion.
//!
//! Runs once, after every worker and the committer have finished. Any
//! identity still unconfirmed in the cache had no file in this run.

use super::{EventSink, SyncStats};
use crate::cache::ChangeCache;
use crate::store::Store;

/// Delete records whose source files are gone. Returns the number deleted.
pub fn reap<S: Store + ?Sized>(
    store: &mut S,
    cache: &ChangeCache,
    stats: &SyncStats,
    sink: &dyn EventSink,
) -> usize {
    let orphans = cache.orphans();
    if orphans.is_empty() {
        log::debug!("No orphaned records");
        return 0;
    }

    let titles = match store.titles(&orphans) {
        Ok(titles) => titles,
        Err(e) => {
            // Titles are only for the log lines; deletion still proceeds
            sink.error("Failed to look up titles of orphaned records", &e);
            Vec::new()
        }
    };

    match store.delete_batch(&orphans) {
        Ok(removed) => {
            for id in &orphans {
                let title = titles
                    .iter()
                    .find(|(tid, _)| tid == id)
                    .map_or("", |(_, title)| title.as_str());
                sink.info(&format!("Deleted: id={id}, title=\"{title}\""));
            }
            stats.add_deleted(orphans.len() as u64);
            if removed != orphans.len() {
                log::debug!(
                    "Delete removed {} rows for {} orphans",
                    removed,
                    orphans.len()
                );
            }
            orphans.len()
        }
        Err(e) => {
            sink.error(
                &format!("Failed to delete {} orphaned records", orphans.len()),
                &e,
            );
            stats.add_errored(orphans.len() as u64);
            0
        }
    }
}
