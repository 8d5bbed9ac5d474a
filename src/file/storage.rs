//! Local disk blob store.
//!
//! Blobs are stored in a sharded directory structure:
//! ```text
//! {base_path}/
//! ├── ab/
//! │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
//! ├── cd/
//! │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
//! └── ...
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::blob::{BlobError, BlobStore, StoredBlob};

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
    /// URL prefix under which the base directory is published.
    public_url: String,
}

impl LocalBlobStore {
    /// Create a new store rooted at `base_path`.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>, public_url: impl Into<String>) -> io::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Load a stored blob.
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>, BlobError> {
        let file_path = self.get_file_path(stored_name)?;

        match fs::read(&file_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the full path for a stored name.
    ///
    /// The path is `{base_path}/{shard}/{stored_name}` where shard is the
    /// first 2 characters of the stored name.
    fn get_file_path(&self, stored_name: &str) -> Result<PathBuf, BlobError> {
        if stored_name.is_empty()
            || stored_name.contains(['/', '\\'])
            || stored_name.starts_with('.')
        {
            return Err(BlobError::NotFound(stored_name.to_string()));
        }
        let shard = Self::get_shard(stored_name);
        Ok(self.base_path.join(shard).join(stored_name))
    }

    fn get_shard(stored_name: &str) -> &str {
        stored_name.get(..2).unwrap_or(stored_name)
    }

    /// Extract the file extension from a filename.
    ///
    /// Returns "bin" if no usable extension is found.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
    }

    /// Generate a new UUID-based stored name keeping the original extension.
    pub fn generate_stored_name(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredBlob, BlobError> {
        let stored_name = Self::generate_stored_name(filename);
        let file_path = self.get_file_path(&stored_name)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let size = data.len() as u64;
        fs::write(&file_path, data).await?;

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_url, stored_name),
            blob_ref: stored_name,
            size,
        })
    }

    async fn delete(&self, blob_ref: &str) -> Result<bool, BlobError> {
        let file_path = match self.get_file_path(blob_ref) {
            Ok(path) => path,
            Err(BlobError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn download_url(&self, blob_ref: &str) -> String {
        format!("{}/{}?download=1", self.public_url, blob_ref)
    }

    fn name(&self) -> &'static str {
        "local"
    }

    fn as_local(&self) -> Option<&LocalBlobStore> {
        Some(self)
    }
}
