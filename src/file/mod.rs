//! File and folder management for filenest.
//!
//! - Per-user folder tree with breadcrumb paths
//! - File metadata in SQLite, content in a pluggable blob store
//! - Merged, sorted folder listings

mod blob;
mod cloud;
mod folder;
mod format;
mod listing;
mod metadata;
mod service;
mod storage;

pub use blob::{BlobError, BlobStore, StoredBlob};
pub use cloud::{CloudinaryBlobStore, CloudinaryConfig};
pub use folder::{
    normalize_folder_name, Folder, FolderPath, FolderRepository, NewFolder, PathEntry,
    MAX_FOLDER_NAME_LENGTH, ROOT_PATH_ID, ROOT_PATH_NAME,
};
pub use format::{escape_html, format_file_size};
pub use listing::{sort_entries, ContentLister, Entry, SortKey, SortOrder};
pub use metadata::{logical_path, FileMetadata, FileRepository, NewFile};
pub use service::{sanitize_filename, FileService, FolderService, UploadRequest};
pub use storage::LocalBlobStore;

use std::sync::Arc;

use crate::config::{BlobBackend, BlobConfig};
use crate::{FilenestError, Result};

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Build the blob store selected by the configuration.
pub fn blob_store_from_config(config: &BlobConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        BlobBackend::Local => {
            let store = LocalBlobStore::new(&config.local_path, &config.public_url)?;
            Ok(Arc::new(store))
        }
        BlobBackend::Cloudinary => {
            let store = CloudinaryBlobStore::new(CloudinaryConfig::from(config))
                .map_err(|e| FilenestError::Config(e.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}
