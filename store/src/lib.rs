//! Folio edit store
//!
//! Persistence for in-place content edits on the Folio requirements site.
//! Each editable region is identified by a content key; a user's edit is
//! kept as an override record in shared storage until it is reset.
//!
//! This crate provides:
//! - [`EditStore`]: initialize/save/reset for string content, plus bulk
//!   inspection (list, count, export, reset-all)
//! - [`ListStore`]: the same contract for lists of paragraphs or bullets
//! - [`EditableValue`] / [`EditableList`]: per-key handles with edit mode
//! - [`ModifiedCountWatcher`]: an approximately-live count of overrides
//!
//! Storage is SQLite by default, with an in-memory backend for tests and
//! for running without a writable database.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod editable;
pub mod errors;
pub mod export;
pub mod framing;
pub mod list;
pub mod storage;
pub mod store;
pub mod watch;

pub use config::FolioConfig;
pub use editable::{EditMode, EditableList, EditableValue};
pub use errors::{ErrorCategory, FolioError, Result};
pub use export::{DEFAULT_EXPORT_FILENAME, EXPORT_MIME, ExportDocument};
pub use framing::ListFraming;
pub use list::{ListCodec, ListEditState, ListEncoding, ListStore};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use store::{EditState, EditStore, KEY_DELIMITER};
pub use watch::{ModifiedCountWatcher, StorageEvent};

use std::sync::Arc;

/// Folio store version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main entry point: configuration plus the stores built from it.
#[derive(Debug, Clone)]
pub struct Folio {
    cfg: FolioConfig,
    store: EditStore,
    lists: ListStore,
}

impl Folio {
    /// Load config and open the configured database
    pub fn open() -> Result<Self> {
        let cfg = FolioConfig::load()?;
        Self::with_config(cfg)
    }

    /// Open the database named by `cfg`
    pub fn with_config(cfg: FolioConfig) -> Result<Self> {
        cfg.validate()?;
        let db_path = cfg.resolved_db_path();
        let storage = SqliteStorage::connect_and_init_at_path(&db_path)?;

        tracing::info!(
            version = VERSION,
            db_path = %db_path.display(),
            prefix = %cfg.key_prefix,
            "Folio edit store opened"
        );

        Ok(Self::from_parts(cfg, Arc::new(storage)))
    }

    /// Open the database named by `cfg`, or fall back to memory-only storage
    /// if it cannot be opened. Edits made after a fallback are lost on exit.
    ///
    /// An invalid `cfg` is still an error.
    pub fn with_config_or_memory(cfg: FolioConfig) -> Result<Self> {
        cfg.validate()?;
        let db_path = cfg.resolved_db_path();
        match SqliteStorage::connect_and_init_at_path(&db_path) {
            Ok(storage) => Ok(Self::from_parts(cfg, Arc::new(storage))),
            Err(err) => {
                tracing::warn!(
                    db_path = %db_path.display(),
                    category = err.category().as_str(),
                    error = %err,
                    "Edit storage unavailable, edits will not persist"
                );
                Ok(Self::in_memory(cfg))
            }
        }
    }

    /// Memory-only storage
    pub fn in_memory(cfg: FolioConfig) -> Self {
        Self::from_parts(cfg, Arc::new(MemoryStorage::new()))
    }

    /// Build over any storage backend
    pub fn from_parts(cfg: FolioConfig, storage: Arc<dyn Storage>) -> Self {
        let store = EditStore::from_config(storage, &cfg);
        let lists = ListStore::new(store.clone(), ListCodec::from_config(&cfg));
        Self { cfg, store, lists }
    }

    pub fn config(&self) -> &FolioConfig {
        &self.cfg
    }

    pub fn store(&self) -> &EditStore {
        &self.store
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    /// Mount a handle for string content
    pub fn editable(&self, content_key: &str, original: &str) -> EditableValue {
        EditableValue::mount(&self.store, content_key, original)
    }

    /// Mount a handle for list content
    pub fn editable_list(
        &self,
        framing: ListFraming,
        content_key: &str,
        original: Vec<String>,
    ) -> EditableList {
        EditableList::mount(&self.lists, framing, content_key, original)
    }

    /// Start a count watcher using the configured poll interval. Also
    /// watches the database file when there is one.
    ///
    /// Must be called inside a tokio runtime.
    pub fn watch_count(&self) -> Result<ModifiedCountWatcher> {
        ModifiedCountWatcher::spawn_with_file_watch(self.store.clone(), self.cfg.poll_interval())
    }
}
