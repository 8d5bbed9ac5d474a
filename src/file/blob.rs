//! Pluggable blob storage for file content.
//!
//! Metadata lives in SQLite; the bytes live behind a [`BlobStore`].

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),

    /// The remote provider could not be reached or answered with an error status.
    #[error("blob provider request failed: {0}")]
    Http(String),

    /// The remote provider answered with a body we could not interpret.
    #[error("unexpected blob provider response: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        BlobError::Storage(e.to_string())
    }
}

/// Where an uploaded blob ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Opaque provider reference used for deletion and link building.
    pub blob_ref: String,
    /// Public URL of the stored content.
    pub url: String,
    /// Size in bytes as stored.
    pub size: u64,
}

/// Storage backend for uploaded file content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return its provider reference.
    ///
    /// `filename` is the user-facing name; implementations may use its
    /// extension but must not trust it as a path.
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredBlob, BlobError>;

    /// Delete a blob. Returns `true` if it existed.
    ///
    /// A blob that is already gone is reported as `Ok(false)`, never as an error.
    async fn delete(&self, blob_ref: &str) -> Result<bool, BlobError>;

    /// URL that makes the browser download the blob as an attachment.
    fn download_url(&self, blob_ref: &str) -> String;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// The local disk store behind this backend, if any.
    ///
    /// Local blobs are served by the application itself.
    fn as_local(&self) -> Option<&super::LocalBlobStore> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_error_display() {
        assert_eq!(
            BlobError::NotFound("abc".to_string()).to_string(),
            "blob not found: abc"
        );
        assert!(BlobError::Http("502".to_string())
            .to_string()
            .contains("request failed"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BlobError = io.into();
        assert!(matches!(err, BlobError::Storage(_)));
    }
}
