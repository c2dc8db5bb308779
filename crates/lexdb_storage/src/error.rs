//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk log is corrupted beyond the recoverable tail.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store's lock file.
    #[error("store locked: another process has exclusive access to {path:?}")]
    Locked {
        /// The locked directory.
        path: PathBuf,
    },

    /// The store directory does not exist and creation was not requested.
    #[error("store not found at {path:?}")]
    NotFound {
        /// The missing directory.
        path: PathBuf,
    },
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
