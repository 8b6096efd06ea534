//! Editable value store
//!
//! Maps content keys to override strings kept in shared [`Storage`]. An
//! override exists only while the saved value differs from the caller's
//! original; saving the original back deletes it.
//!
//! Storage failures never escape the edit operations. The in-memory result
//! is returned regardless and `synced` says whether storage agrees with it.

use crate::config::FolioConfig;
use crate::errors::{FolioError, Result};
use crate::export::ExportDocument;
use crate::storage::Storage;
use crate::watch::StorageEvent;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Separates the reserved prefix from the content key in storage keys.
pub const KEY_DELIMITER: char = ':';

/// Capacity of the change-feed channel; slow subscribers see `Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Effective state of one content key after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    /// Value to render
    pub value: String,
    /// True iff `value` differs from the original
    pub is_modified: bool,
    /// False when storage failed and the state exists only in memory
    pub synced: bool,
}

impl EditState {
    fn unmodified(original: &str, synced: bool) -> Self {
        Self {
            value: original.to_string(),
            is_modified: false,
            synced,
        }
    }
}

/// Handle to the override records of one prefix.
///
/// Cheap to clone; clones share storage and the change feed.
#[derive(Clone)]
pub struct EditStore {
    storage: Arc<dyn Storage>,
    prefix: String,
    events: broadcast::Sender<StorageEvent>,
}

impl std::fmt::Debug for EditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditStore")
            .field("prefix", &self.prefix)
            .field("location", &self.storage.location())
            .finish()
    }
}

impl EditStore {
    /// Create a store over `storage` using `prefix` to mark its records.
    pub fn new(storage: Arc<dyn Storage>, prefix: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            prefix: prefix.into(),
            events,
        }
    }

    /// Create a store with the prefix from `cfg`.
    pub fn from_config(storage: Arc<dyn Storage>, cfg: &FolioConfig) -> Self {
        Self::new(storage, cfg.key_prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Storage key for a content key: `"<prefix>:<content key>"`.
    pub fn storage_key(&self, content_key: &str) -> String {
        format!("{}{KEY_DELIMITER}{content_key}", self.prefix)
    }

    fn scan_prefix(&self) -> String {
        format!("{}{KEY_DELIMITER}", self.prefix)
    }

    /// Strip the prefix from a storage key, if it belongs to this store.
    pub fn content_key<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        storage_key
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(KEY_DELIMITER))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-key operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Effective value for `content_key` on first render.
    ///
    /// Adopts a stored override only when it differs from `original`.
    pub fn initialize(&self, content_key: &str, original: &str) -> EditState {
        match self.read_override(content_key) {
            Ok(Some(stored)) if stored != original => EditState {
                value: stored,
                is_modified: true,
                synced: true,
            },
            Ok(_) => EditState::unmodified(original, true),
            Err(err) => {
                log_degraded(&err, content_key, "read override");
                EditState::unmodified(original, false)
            }
        }
    }

    /// Save `new_value` for `content_key`.
    ///
    /// Persists the value when it differs from `original` and deletes the
    /// record otherwise.
    pub fn save(&self, content_key: &str, original: &str, new_value: &str) -> EditState {
        let is_modified = new_value != original;
        let outcome = if is_modified {
            self.write_override(content_key, new_value)
        } else {
            self.remove_override(content_key)
        };

        let synced = match outcome {
            Ok(()) => true,
            Err(err) => {
                log_degraded(&err, content_key, "save override");
                false
            }
        };

        EditState {
            value: new_value.to_string(),
            is_modified,
            synced,
        }
    }

    /// Restore `original` for `content_key` and delete its record.
    pub fn reset(&self, content_key: &str, original: &str) -> EditState {
        let synced = match self.remove_override(content_key) {
            Ok(()) => true,
            Err(err) => {
                log_degraded(&err, content_key, "reset override");
                false
            }
        };
        EditState::unmodified(original, synced)
    }

    /// Raw stored override for `content_key`.
    pub fn read_override(&self, content_key: &str) -> Result<Option<String>> {
        self.storage.get(&self.storage_key(content_key))
    }

    fn write_override(&self, content_key: &str, value: &str) -> Result<()> {
        self.storage.set(&self.storage_key(content_key), value)?;
        tracing::debug!(content_key, "Stored override");
        self.publish(StorageEvent::Set(content_key.to_string()));
        Ok(())
    }

    fn remove_override(&self, content_key: &str) -> Result<()> {
        self.storage.delete(&self.storage_key(content_key))?;
        tracing::debug!(content_key, "Removed override");
        self.publish(StorageEvent::Removed(content_key.to_string()));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Bulk inspection
    // ─────────────────────────────────────────────────────────────────────────────

    /// Every content key with a stored override, whether mounted or not.
    ///
    /// Returns an empty set when storage cannot be scanned.
    pub fn list_modified_keys(&self) -> BTreeSet<String> {
        self.try_list_modified_keys().unwrap_or_else(|err| {
            tracing::warn!(
                category = err.category().as_str(),
                error = %err,
                "Failed to scan overrides, reporting none"
            );
            BTreeSet::new()
        })
    }

    /// Like [`Self::list_modified_keys`] but surfaces the storage error.
    pub fn try_list_modified_keys(&self) -> Result<BTreeSet<String>> {
        let keys = self.storage.keys_with_prefix(&self.scan_prefix())?;
        Ok(keys
            .iter()
            .filter_map(|k| self.content_key(k))
            .map(str::to_string)
            .collect())
    }

    /// Number of stored overrides.
    pub fn modified_count(&self) -> usize {
        self.list_modified_keys().len()
    }

    /// Dump every stored override as `content key -> raw value`.
    ///
    /// Keys whose value cannot be read at this point are skipped.
    pub fn export_all(&self) -> ExportDocument {
        let mut doc = ExportDocument::new();
        for content_key in self.list_modified_keys() {
            match self.read_override(&content_key) {
                Ok(Some(value)) => doc.insert(content_key, value),
                Ok(None) => {
                    tracing::warn!(
                        content_key = %content_key,
                        "Override vanished during export, skipped"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        content_key = %content_key,
                        category = err.category().as_str(),
                        error = %err,
                        "Override unreadable during export, skipped"
                    );
                }
            }
        }
        tracing::debug!(entries = doc.len(), "Exported overrides");
        doc
    }

    /// Delete every override under this prefix. Returns how many were removed.
    ///
    /// Irreversible; callers confirm with the user first. Records that fail
    /// to delete are logged and left in place.
    pub fn reset_all(&self) -> usize {
        let keys = match self.storage.keys_with_prefix(&self.scan_prefix()) {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(
                    category = err.category().as_str(),
                    error = %err,
                    "Failed to scan overrides, nothing reset"
                );
                return 0;
            }
        };

        let mut removed = 0;
        for key in &keys {
            match self.storage.delete(key) {
                Ok(()) => removed += 1,
                Err(err) => {
                    tracing::warn!(
                        key = %key,
                        category = err.category().as_str(),
                        error = %err,
                        "Failed to delete override during reset-all"
                    );
                }
            }
        }

        tracing::info!(removed, total = keys.len(), "Reset all overrides");
        self.publish(StorageEvent::Cleared);
        removed
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Change feed
    // ─────────────────────────────────────────────────────────────────────────────

    /// Receive an event for every mutation made through this store (or any
    /// clone of it), plus [`StorageEvent::External`] nudges.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Signal that storage may have changed outside this handle.
    pub fn notify_external(&self) {
        self.publish(StorageEvent::External);
    }

    fn publish(&self, event: StorageEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn log_degraded(err: &FolioError, content_key: &str, operation: &str) {
    if err.category().is_degradable() {
        tracing::warn!(
            content_key,
            operation,
            category = err.category().as_str(),
            error = %err,
            "Storage unavailable, keeping in-memory state only"
        );
    } else {
        tracing::error!(
            content_key,
            operation,
            category = err.category().as_str(),
            error = %err,
            "Unexpected storage failure, keeping in-memory state only"
        );
    }
}
