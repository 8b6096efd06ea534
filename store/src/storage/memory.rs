//! In-memory storage with fault injection.
//!
//! Used by tests and by callers that run without a database. The fault
//! switches simulate a disabled or full storage backend so the best-effort
//! paths of the edit store can be exercised deterministically.

use super::Storage;
use crate::errors::{FolioError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// `BTreeMap`-backed [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Keys that disappear the next time they are read.
    vanishing: Mutex<BTreeSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get` and `keys_with_prefix` fail until switched off.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` and `delete` fail until switched off, like a
    /// browser store that is over quota or disabled.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Remove `key` right before its next read, as if another writer had
    /// cleared it between a scan and the read that follows.
    pub fn vanish_on_read(&self, key: &str) -> Result<()> {
        self.vanishing_guard()?.insert(key.to_string());
        Ok(())
    }

    /// Snapshot of everything stored, regardless of prefix.
    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.entries_guard()?.clone())
    }

    /// Number of stored entries, regardless of prefix.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries_guard()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries_guard()?.is_empty())
    }

    fn entries_guard(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| FolioError::internal("memory storage lock poisoned"))
    }

    fn vanishing_guard(&self) -> Result<std::sync::MutexGuard<'_, BTreeSet<String>>> {
        self.vanishing
            .lock()
            .map_err(|_| FolioError::internal("memory storage lock poisoned"))
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(FolioError::storage("storage is unavailable for reading"));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FolioError::storage_with_source(
                "storage rejected the write",
                std::io::Error::other("quota exceeded"),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_reads()?;
        if self.vanishing_guard()?.remove(key) {
            self.entries_guard()?.remove(key);
            return Ok(None);
        }
        Ok(self.entries_guard()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writes()?;
        self.entries_guard()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_writes()?;
        self.entries_guard()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_reads()?;
        Ok(self
            .entries_guard()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let storage = MemoryStorage::new();
        storage.set("a:1", "one").expect("set");
        assert_eq!(storage.get("a:1").expect("get"), Some("one".to_string()));

        storage.set("a:1", "uno").expect("overwrite");
        assert_eq!(storage.get("a:1").expect("get"), Some("uno".to_string()));

        storage.delete("a:1").expect("delete");
        assert_eq!(storage.get("a:1").expect("get"), None);

        // Deleting again is fine
        storage.delete("a:1").expect("delete missing");
    }

    #[test]
    fn test_keys_with_prefix_filters_and_sorts() {
        let storage = MemoryStorage::new();
        storage.set("edit:b", "2").expect("set");
        storage.set("other:x", "?").expect("set");
        storage.set("edit:a", "1").expect("set");

        let keys = storage.keys_with_prefix("edit:").expect("scan");
        assert_eq!(keys, vec!["edit:a", "edit:b"]);
    }

    #[test]
    fn test_fail_writes_leaves_data_untouched() {
        let storage = MemoryStorage::new();
        storage.set("k", "before").expect("set");

        storage.fail_writes(true);
        assert!(storage.set("k", "after").is_err());
        assert!(storage.delete("k").is_err());

        storage.fail_writes(false);
        assert_eq!(storage.get("k").expect("get"), Some("before".to_string()));
    }

    #[test]
    fn test_fail_reads() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").expect("set");
        storage.fail_reads(true);
        assert!(storage.get("k").is_err());
        assert!(storage.keys_with_prefix("").is_err());
    }

    #[test]
    fn test_vanish_on_read() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").expect("set");
        storage.vanish_on_read("k").expect("arm");

        assert_eq!(storage.keys_with_prefix("").expect("scan"), vec!["k"]);
        assert_eq!(storage.get("k").expect("get"), None);
        assert!(storage.is_empty().expect("len"));
    }
}
