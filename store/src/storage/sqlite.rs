//! SQLite-backed storage
//!
//! Persists override records in a single `kv_store` table. Several handles,
//! including handles in other processes, may open the same file; the last
//! write to a key wins.

use super::Storage;
use crate::errors::{FolioError, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Embedded schema SQL from FOLIO_SCHEMA.sql
const SCHEMA_SQL: &str = include_str!("../../FOLIO_SCHEMA.sql");

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// SQLite database wrapper
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Connect to a specific database path and initialize the schema
    ///
    /// Creates the database file (and its parent directory) if needed.
    pub fn connect_and_init_at_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                FolioError::storage_with_source(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            FolioError::storage_with_source(format!("failed to open db at {}", path.display()), e)
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| FolioError::storage_with_source("failed to set busy timeout", e))?;

        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "Edit storage initialized");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Connect to an in-memory database
    pub fn connect_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FolioError::storage_with_source("failed to open in-memory db", e))?;

        Self::apply_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Apply the schema to the database
    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| FolioError::storage_with_source("failed to apply schema", e))?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FolioError::internal("sqlite connection lock poisoned"))
    }

    /// Total number of rows, with or without the edit prefix (for debugging)
    pub fn row_count(&self) -> Result<i64> {
        self.conn()?
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .map_err(|e| FolioError::storage_with_source("failed to count rows", e))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FolioError::storage_with_source("failed to read value", e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?
            .execute(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = ?2,
                    updated_at = ?3
                "#,
                params![key, value, now],
            )
            .map_err(|e| FolioError::storage_with_source("failed to write value", e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(|e| FolioError::storage_with_source("failed to delete value", e))?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        // substr instead of LIKE so '%' and '_' in keys stay literal
        let mut stmt = conn
            .prepare(
                r#"
                SELECT key
                FROM kv_store
                WHERE substr(key, 1, length(?1)) = ?1
                ORDER BY key
                "#,
            )
            .map_err(|e| FolioError::storage_with_source("failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![prefix], |row| row.get(0))
            .map_err(|e| FolioError::storage_with_source("failed to scan keys", e))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| FolioError::storage_with_source("failed to read key", e))?);
        }
        Ok(keys)
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
