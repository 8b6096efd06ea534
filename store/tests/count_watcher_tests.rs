//! Modified-count watcher over SQLite, including writes from another handle.

use folio_store::{EditStore, ModifiedCountWatcher, SqliteStorage};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn sqlite_store(path: &Path) -> EditStore {
    let storage = SqliteStorage::connect_and_init_at_path(path).expect("should open db");
    EditStore::new(Arc::new(storage), "folio-edit")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn count_tracks_writes_through_the_watched_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = sqlite_store(&dir.path().join("edits.db"));

    let mut watcher = ModifiedCountWatcher::spawn_with_file_watch(
        store.clone(),
        Duration::from_secs(60),
    )
    .expect("should start watcher");
    assert_eq!(watcher.count(), 0);

    store.save("a", "O", "1");
    let count = timeout(Duration::from_secs(5), watcher.changed())
        .await
        .expect("should update");
    assert_eq!(count, Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn count_picks_up_writes_from_another_handle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("edits.db");
    let watched = sqlite_store(&path);
    let other = sqlite_store(&path);

    // Short poll so the test does not depend on filesystem notifications.
    let watcher =
        ModifiedCountWatcher::spawn_with_file_watch(watched, Duration::from_millis(50))
            .expect("should start watcher");
    let mut rx = watcher.subscribe();

    other.save("a", "O", "1");
    other.save("b", "O", "2");

    timeout(Duration::from_secs(5), async {
        while *rx.borrow_and_update() != 2 {
            rx.changed().await.expect("watcher alive");
        }
    })
    .await
    .expect("count should reach 2");
    assert_eq!(watcher.count(), 2);
}
