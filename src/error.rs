//! Error types for filenest.

use thiserror::Error;

/// Common error type for filenest.
#[derive(Error, Debug)]
pub enum FilenestError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (or not owned by the caller).
    #[error("{0} not found")]
    NotFound(String),

    /// A unique value is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Folder still has child folders or files.
    #[error("folder not empty")]
    FolderNotEmpty,

    /// Folder move would create a cycle.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Blob storage provider failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FilenestError {
    fn from(e: sqlx::Error) -> Self {
        FilenestError::Database(e.to_string())
    }
}

impl From<crate::file::BlobError> for FilenestError {
    fn from(e: crate::file::BlobError) -> Self {
        FilenestError::Upstream(e.to_string())
    }
}

/// Result type alias for filenest operations.
pub type Result<T> = std::result::Result<T, FilenestError>;
