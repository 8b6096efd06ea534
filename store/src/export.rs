//! Export documents
//!
//! A flat JSON object of bare content keys to raw stored values. List
//! content stays in its encoded form: this is a dump of storage, not a
//! semantic format.

use crate::errors::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// MIME type of an exported document
pub const EXPORT_MIME: &str = "application/json";

/// File name used when exporting into a directory
pub const DEFAULT_EXPORT_FILENAME: &str = "folio-edits.json";

/// Snapshot of all stored overrides, ordered by content key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportDocument {
    entries: BTreeMap<String, String>,
}

impl ExportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(content_key.into(), value.into());
    }

    pub fn get(&self, content_key: &str) -> Option<&str> {
        self.entries.get(content_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Pretty-printed JSON, two-space indented like a browser download.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FolioError::export_with_source("failed to serialize export", e))
    }

    /// Parse a previously exported document.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| FolioError::export_with_source("failed to parse export", e))
    }

    /// Write the document to `target`.
    ///
    /// When `target` is an existing directory the file is named `filename`
    /// inside it. The write goes through a `.tmp` sibling and a rename, so
    /// readers never see a partial file. Returns the path written.
    pub fn write_to_path(&self, target: &Path, filename: &str) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(filename)
        } else {
            target.to_path_buf()
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(FolioError::export(format!(
                "export directory {} does not exist",
                parent.display()
            )));
        }

        let json = self.to_json_pretty()?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes()).map_err(|e| {
            FolioError::export_with_source(format!("failed to write {}", tmp.display()), e)
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            FolioError::export_with_source(format!("failed to move export to {}", path.display()), e)
        })?;

        tracing::info!(path = %path.display(), entries = self.len(), "Wrote export");
        Ok(path)
    }
}

impl FromIterator<(String, String)> for ExportDocument {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
