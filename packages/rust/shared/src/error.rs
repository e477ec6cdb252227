//! Error types for Pagemark.
//!
//! Library crates use [`PagemarkError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Pagemark operations.
#[derive(Debug, thiserror::Error)]
pub enum PagemarkError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during fetch, lookup, or filtering.
    #[error("network error: {0}")]
    Network(String),

    /// Document cache (storage layer) error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filtering service error (request, API, or response shape).
    #[error("filter error: {0}")]
    Filter(String),

    /// Data validation error (invalid URL, malformed payload, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagemarkError>;

impl PagemarkError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
