//! Change feed and modified-count watcher.
//!
//! Keeps an approximately-live count of stored overrides without anyone
//! having to re-scan by hand. The count is refreshed when:
//!
//! - a mutation goes through any clone of the watched [`EditStore`]
//! - the backing database file changes on disk (another process wrote it)
//! - a periodic tick fires, as a fallback for anything missed
//!
//! ```text
//! save/reset ──▶ broadcast ─┐
//! db file change ─▶ debouncer ─▶ notify_external ─┤──▶ rescan ──▶ watch::Sender<usize>
//! interval tick ────────────┘
//! ```

use crate::errors::{FolioError, Result};
use crate::store::EditStore;
use notify::{EventKind, RecursiveMode, Watcher};
use notify_debouncer_full::{DebounceEventResult, Debouncer, FileIdMap, new_debouncer};
use std::path::Path;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Debounce window for filesystem notifications on the database file
const FILE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Shortest accepted rescan period; `tokio::time::interval` rejects zero
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A change to stored overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// An override was written for this content key.
    Set(String),
    /// The override for this content key was deleted.
    Removed(String),
    /// Every override was deleted.
    Cleared,
    /// Storage may have changed outside this process's handles.
    External,
}

/// Background task publishing the number of stored overrides.
///
/// Must be created inside a tokio runtime. Dropping the watcher stops the
/// task and any filesystem watch.
pub struct ModifiedCountWatcher {
    count_rx: watch::Receiver<usize>,
    task: JoinHandle<()>,
    /// Filesystem watcher (kept alive for monitoring).
    #[allow(dead_code)]
    debouncer: Option<Debouncer<notify::RecommendedWatcher, FileIdMap>>,
}

impl ModifiedCountWatcher {
    /// Watch `store`, rescanning at least every `poll_interval` (raised to
    /// 1ms if shorter).
    pub fn spawn(store: EditStore, poll_interval: Duration) -> Self {
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let initial = store.modified_count();
        let (count_tx, count_rx) = watch::channel(initial);
        let events = store.subscribe();

        let task = tokio::spawn(run_refresh_loop(store, events, poll_interval, count_tx));

        Self {
            count_rx,
            task,
            debouncer: None,
        }
    }

    /// Like [`Self::spawn`], and also rescan when the storage file changes.
    ///
    /// Falls back to polling only when the storage has no backing file.
    pub fn spawn_with_file_watch(store: EditStore, poll_interval: Duration) -> Result<Self> {
        let location = store.storage().location().map(Path::to_path_buf);
        let mut watcher = Self::spawn(store.clone(), poll_interval);

        if let Some(path) = location {
            watcher.debouncer = Some(watch_storage_file(store, &path)?);
            tracing::debug!(path = %path.display(), "Watching edit storage file");
        }

        Ok(watcher)
    }

    /// Most recently published count.
    pub fn count(&self) -> usize {
        *self.count_rx.borrow()
    }

    /// Independent receiver for the count.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_rx.clone()
    }

    /// Wait until the count changes and return the new value. Returns `None`
    /// once the refresh task has stopped.
    pub async fn changed(&mut self) -> Option<usize> {
        self.count_rx.changed().await.ok()?;
        Some(*self.count_rx.borrow_and_update())
    }
}

impl Drop for ModifiedCountWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_refresh_loop(
    store: EditStore,
    mut events: broadcast::Receiver<StorageEvent>,
    poll_interval: Duration,
    count_tx: watch::Sender<usize>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial count is already set.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            event = events.recv() => match event {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Count watcher lagged behind change feed");
                }
                // `store` holds a sender, so this only happens on shutdown.
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }

        refresh_count(&store, &count_tx);

        if count_tx.is_closed() {
            break;
        }
    }
}

fn refresh_count(store: &EditStore, count_tx: &watch::Sender<usize>) {
    match store.try_list_modified_keys() {
        Ok(keys) => {
            let count = keys.len();
            count_tx.send_if_modified(|current| {
                if *current == count {
                    false
                } else {
                    *current = count;
                    true
                }
            });
        }
        Err(err) => {
            tracing::warn!(
                category = err.category().as_str(),
                error = %err,
                "Failed to refresh modified count, keeping previous value"
            );
        }
    }
}

/// Nudge `store`'s change feed whenever the file at `path` changes.
fn watch_storage_file(
    store: EditStore,
    path: &Path,
) -> Result<Debouncer<notify::RecommendedWatcher, FileIdMap>> {
    let mut debouncer = new_debouncer(FILE_DEBOUNCE, None, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                let relevant = events.iter().any(|e| {
                    matches!(
                        e.event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                });
                if relevant {
                    store.notify_external();
                }
            }
            Err(errors) => {
                for error in errors {
                    tracing::error!("Filesystem watcher error: {error:?}");
                }
            }
        }
    })
    .map_err(|e| FolioError::storage_with_source("failed to create filesystem watcher", e))?;

    debouncer
        .watcher()
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            FolioError::storage_with_source(format!("failed to watch {}", path.display()), e)
        })?;

    Ok(debouncer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use tokio::time::timeout;

    fn store() -> (Arc<MemoryStorage>, EditStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), EditStore::new(storage, "folio-edit"))
    }

    #[tokio::test]
    async fn test_initial_count() {
        let (_, store) = store();
        store.save("a", "O", "1");
        store.save("b", "O", "2");

        let watcher = ModifiedCountWatcher::spawn(store, Duration::from_secs(60));
        assert_eq!(watcher.count(), 2);
    }

    #[tokio::test]
    async fn test_count_follows_change_feed() {
        let (_, store) = store();
        let mut watcher = ModifiedCountWatcher::spawn(store.clone(), Duration::from_secs(60));
        assert_eq!(watcher.count(), 0);

        store.save("a", "O", "1");
        let count = timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("count should update without waiting for a tick");
        assert_eq!(count, Some(1));

        store.reset_all();
        let count = timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("count should update");
        assert_eq!(count, Some(0));
    }

    #[tokio::test]
    async fn test_poll_picks_up_writes_behind_the_store() {
        let (storage, store) = store();
        let mut watcher = ModifiedCountWatcher::spawn(store, Duration::from_millis(20));

        // Written straight to storage: no change-feed event.
        crate::storage::Storage::set(storage.as_ref(), "folio-edit:x", "v").expect("set");

        let count = timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("poll should notice");
        assert_eq!(count, Some(1));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_refreshes() {
        let (storage, store) = store();
        let mut watcher = ModifiedCountWatcher::spawn(store, Duration::ZERO);

        crate::storage::Storage::set(storage.as_ref(), "folio-edit:x", "v").expect("set");

        let count = timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("refresh task should keep running");
        assert_eq!(count, Some(1));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_count() {
        let (storage, store) = store();
        store.save("a", "O", "1");
        let watcher = ModifiedCountWatcher::spawn(store.clone(), Duration::from_millis(10));

        storage.fail_reads(true);
        store.notify_external();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(watcher.count(), 1);
    }

    #[tokio::test]
    async fn test_file_watch_without_location_polls_only() {
        let (_, store) = store();
        let watcher = ModifiedCountWatcher::spawn_with_file_watch(store, Duration::from_secs(1))
            .expect("memory storage needs no file watch");
        assert!(watcher.debouncer.is_none());
    }
}
