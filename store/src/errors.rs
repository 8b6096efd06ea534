//! Folio error types
//!
//! Every storage-facing failure is representable here so it can be logged
//! with a category. The public edit operations never return these: they
//! degrade to "changed in memory, not persisted" and report that through
//! the `synced` flag on their result.

use thiserror::Error;

/// Error category for structured logging and behavior mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `folio.toml` or env misconfigured
    ConfigError,
    /// Backing key-value storage unavailable, full, or failing
    StorageError,
    /// A stored value could not be encoded or decoded
    EncodingError,
    /// Writing or parsing an export document failed
    ExportError,
    /// Unexpected logic bugs (poisoned locks and the like)
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::EncodingError => "ENCODING_ERROR",
            Self::ExportError => "EXPORT_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether an edit operation may swallow this error and continue with
    /// its in-memory result.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::StorageError | Self::EncodingError | Self::InternalError
        )
    }
}

/// Folio error with category and context
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("encoding error: {message}")]
    Encoding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("export error: {message}")]
    Export {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FolioError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Storage { .. } => ErrorCategory::StorageError,
            Self::Encoding { .. } => ErrorCategory::EncodingError,
            Self::Export { .. } => ErrorCategory::ExportError,
            Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an encoding error with source
    pub fn encoding_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encoding {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
            source: None,
        }
    }

    /// Create an export error with source
    pub fn export_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Export {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for Folio operations
pub type Result<T> = std::result::Result<T, FolioError>;
