//! Key-value storage backends
//!
//! The edit store only ever talks to storage through [`Storage`]. Keys passed
//! here are full storage keys (`"<prefix>:<content key>"`); the prefix
//! handling lives in [`crate::store`].

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::errors::Result;
use std::path::Path;

/// Shared, mutable key-value storage.
///
/// Implementations must be usable from several handles at once. No ordering
/// is promised beyond last-write-wins on a single key.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// All stored keys that start with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// File backing this storage, when there is one to watch.
    fn location(&self) -> Option<&Path> {
        None
    }
}
