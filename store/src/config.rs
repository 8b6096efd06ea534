//! Folio configuration loading
//!
//! Loads configuration from `~/.config/folio/folio.toml` (or `FOLIO_CONFIG` env).
//! Every field has a default, so a missing file is not an error.

use crate::errors::{FolioError, Result};
use crate::list::ListEncoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the edit store
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FolioConfig {
    /// Reserved prefix that marks this subsystem's records in shared storage
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Path to the SQLite database holding override records
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// How list content (paragraphs, bullets) is packed into one stored string
    #[serde(default)]
    pub list_encoding: ListEncoding,

    /// Reserved token joining list items under `list_encoding = "separator"`
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Fallback refresh period for the modified-count watcher
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// File name used when exporting into a directory
    #[serde(default = "default_export_filename")]
    pub export_filename: String,
}

fn default_key_prefix() -> String {
    "folio-edit".to_string()
}

fn default_db_path() -> String {
    dirs::home_dir()
        .map(|h| {
            h.join(".config")
                .join("folio")
                .join("edits.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "folio-edits.db".to_string())
}

fn default_separator() -> String {
    "\n|||\n".to_string()
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_export_filename() -> String {
    crate::export::DEFAULT_EXPORT_FILENAME.to_string()
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            db_path: default_db_path(),
            list_encoding: ListEncoding::default(),
            separator: default_separator(),
            poll_interval_ms: default_poll_interval_ms(),
            export_filename: default_export_filename(),
        }
    }
}

impl FolioConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "FOLIO_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "folio.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `FOLIO_CONFIG` environment variable
    /// 2. `~/.config/folio/folio.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "Folio config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FolioError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: FolioConfig = toml::from_str(contents)
            .map_err(|e| FolioError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the configuration file path
    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("folio")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(FolioError::config("key_prefix must not be empty"));
        }

        // The prefix and the content key are joined with ':'; a colon inside
        // the prefix would make prefix scans ambiguous.
        if self.key_prefix.contains(crate::store::KEY_DELIMITER) {
            return Err(FolioError::config(format!(
                "key_prefix must not contain '{}'",
                crate::store::KEY_DELIMITER
            )));
        }

        if self.separator.is_empty() {
            return Err(FolioError::config("separator must not be empty"));
        }

        if self.poll_interval_ms == 0 {
            return Err(FolioError::config("poll_interval_ms must be greater than 0"));
        }

        if self.poll_interval_ms < 250 {
            tracing::warn!(
                poll_interval_ms = self.poll_interval_ms,
                "Very short poll interval, the count watcher will scan storage constantly"
            );
        }

        if self.export_filename.is_empty() {
            return Err(FolioError::config("export_filename must not be empty"));
        }

        Ok(())
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> PathBuf {
        let path = &self.db_path;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Refresh period for the modified-count watcher
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
