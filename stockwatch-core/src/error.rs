//! Error types for the on-disk job state

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry and marker operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing job state files
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry could not be serialized
    #[error("Failed to encode job registry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
