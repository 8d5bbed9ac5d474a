//! Folder and file services.
//!
//! These wrap the repositories with validation, ownership checks and the
//! blob store round trips.

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::{FilenestError, Result};

use super::blob::BlobStore;
use super::folder::{normalize_folder_name, Folder, FolderPath, FolderRepository, NewFolder};
use super::metadata::{FileMetadata, FileRepository, NewFile};
use super::{DEFAULT_MAX_FILE_SIZE, MAX_FILENAME_LENGTH};

/// Operations on a user's folder tree.
pub struct FolderService<'a> {
    db: &'a Database,
}

impl<'a> FolderService<'a> {
    /// Create a new FolderService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn repo(&self) -> FolderRepository<'_> {
        FolderRepository::new(self.db.pool())
    }

    async fn require_folder(&self, owner: i64, id: i64) -> Result<Folder> {
        self.repo()
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| FilenestError::NotFound("folder".to_string()))
    }

    /// Get a folder owned by `owner`.
    pub async fn get_folder(&self, owner: i64, id: i64) -> Result<Folder> {
        self.require_folder(owner, id).await
    }

    /// Create a folder under `parent` (None = root).
    pub async fn create_folder(
        &self,
        owner: i64,
        name: &str,
        parent: Option<i64>,
    ) -> Result<Folder> {
        let name = normalize_folder_name(name)?;
        if let Some(parent_id) = parent {
            self.require_folder(owner, parent_id).await?;
        }

        let folder = self
            .repo()
            .create(&NewFolder::new(owner, name).with_parent_opt(parent))
            .await?;

        info!(user_id = owner, folder_id = folder.id, parent_id = ?parent, "Folder created");
        Ok(folder)
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, owner: i64, id: i64, new_name: &str) -> Result<Folder> {
        let name = normalize_folder_name(new_name)?;
        let folder = self
            .repo()
            .rename(owner, id, &name)
            .await?
            .ok_or_else(|| FilenestError::NotFound("folder".to_string()))?;

        debug!(user_id = owner, folder_id = id, "Folder renamed");
        Ok(folder)
    }

    /// Count direct child folders and files.
    pub async fn count_children(&self, owner: i64, id: i64) -> Result<(i64, i64)> {
        self.require_folder(owner, id).await?;
        let folders = self.repo().count_children(owner, id).await?;
        let files = FileRepository::new(self.db.pool())
            .count_by_folder(owner, id)
            .await?;
        Ok((folders, files))
    }

    /// Delete an empty folder.
    ///
    /// Returns the former parent id so callers can navigate back.
    pub async fn delete_folder(&self, owner: i64, id: i64) -> Result<Option<i64>> {
        let folder = self.require_folder(owner, id).await?;

        let (folders, files) = self.count_children(owner, id).await?;
        if folders > 0 || files > 0 {
            debug!(
                user_id = owner,
                folder_id = id,
                folders,
                files,
                "Refusing to delete non-empty folder"
            );
            return Err(FilenestError::FolderNotEmpty);
        }

        if !self.repo().delete(owner, id).await? {
            return Err(FilenestError::NotFound("folder".to_string()));
        }

        info!(user_id = owner, folder_id = id, "Folder deleted");
        Ok(folder.parent_id)
    }

    /// Parent of a folder (None = root level).
    pub async fn get_parent(&self, owner: i64, id: i64) -> Result<Option<i64>> {
        self.repo()
            .get_parent(owner, id)
            .await?
            .ok_or_else(|| FilenestError::NotFound("folder".to_string()))
    }

    /// Ancestors of a folder, root first.
    pub async fn ancestors(&self, owner: i64, id: i64) -> Result<Vec<Folder>> {
        self.repo().ancestors(owner, id).await
    }

    /// Full breadcrumb trail of a folder.
    pub async fn get_folder_path(&self, owner: i64, id: i64) -> Result<FolderPath> {
        let ancestors = self.ancestors(owner, id).await?;
        Ok(FolderPath::new(&ancestors))
    }

    /// Move a folder under `new_parent` (None = root).
    ///
    /// Moving a folder into itself or one of its descendants is rejected.
    /// The cycle check and the write are a single statement, so concurrent
    /// moves cannot combine into a cycle.
    pub async fn move_folder(
        &self,
        owner: i64,
        id: i64,
        new_parent: Option<i64>,
    ) -> Result<Folder> {
        if new_parent == Some(id) {
            self.require_folder(owner, id).await?;
            return Err(FilenestError::InvalidMove(
                "a folder cannot contain itself".to_string(),
            ));
        }

        if let Some(folder) = self.repo().move_under(owner, id, new_parent).await? {
            info!(user_id = owner, folder_id = id, parent_id = ?new_parent, "Folder moved");
            return Ok(folder);
        }

        // Nothing was updated: work out why.
        self.require_folder(owner, id).await?;
        if let Some(parent_id) = new_parent {
            self.require_folder(owner, parent_id).await?;
        }
        debug!(user_id = owner, folder_id = id, parent_id = ?new_parent, "Move rejected as cyclic");
        Err(FilenestError::InvalidMove(
            "a folder cannot be moved into its own subfolder".to_string(),
        ))
    }
}

/// An upload waiting to be stored.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target folder (None = root).
    pub folder_id: Option<i64>,
    /// Original filename as sent by the client.
    pub filename: String,
    /// MIME type as sent by the client (may be empty).
    pub content_type: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a root-level upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            folder_id: None,
            filename: filename.into(),
            content_type: String::new(),
            content,
        }
    }

    /// Upload into a folder.
    pub fn in_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Reduce a client supplied filename to a safe display name.
///
/// Any directory components are dropped; the result must be non-empty and
/// at most [`MAX_FILENAME_LENGTH`] characters.
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(FilenestError::Validation(
            "Filename cannot be empty".to_string(),
        ));
    }
    if base.chars().count() > MAX_FILENAME_LENGTH {
        return Err(FilenestError::Validation(format!(
            "Filename must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if base.chars().any(|c| c.is_control()) {
        return Err(FilenestError::Validation(
            "Filename cannot contain control characters".to_string(),
        ));
    }
    Ok(base.to_string())
}

/// File service for uploads, lookups and deletion.
pub struct FileService<'a> {
    db: &'a Database,
    blobs: &'a dyn BlobStore,
    max_file_size: u64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, blobs: &'a dyn BlobStore) -> Self {
        Self {
            db,
            blobs,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create a new FileService with a custom max file size.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Configured maximum upload size in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn repo(&self) -> FileRepository<'_> {
        FileRepository::new(self.db.pool())
    }

    /// Upload a file for `owner`.
    ///
    /// The blob is stored first; if recording the metadata then fails the
    /// blob is removed again on a best-effort basis.
    pub async fn upload(&self, owner: i64, request: UploadRequest) -> Result<FileMetadata> {
        let name = sanitize_filename(&request.filename)?;

        if request.content.len() as u64 > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(FilenestError::Validation(format!(
                "File is too large (max {max_mb}MB)"
            )));
        }

        if let Some(folder_id) = request.folder_id {
            FolderRepository::new(self.db.pool())
                .get_by_id(owner, folder_id)
                .await?
                .ok_or_else(|| FilenestError::NotFound("folder".to_string()))?;
        }

        let size = request.content.len() as i64;
        let stored = self
            .blobs
            .put(&name, &request.content_type, request.content)
            .await
            .map_err(|e| {
                warn!(user_id = owner, backend = self.blobs.name(), error = %e, "Blob upload failed");
                FilenestError::from(e)
            })?;

        let new_file = NewFile::new(owner, name, size, stored.url, stored.blob_ref.clone())
            .in_folder(request.folder_id);

        match self.repo().create(&new_file).await {
            Ok(file) => {
                info!(
                    user_id = owner,
                    file_id = file.id,
                    folder_id = ?file.folder_id,
                    size = file.size,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&stored.blob_ref).await {
                    warn!(blob_ref = %stored.blob_ref, error = %cleanup, "Failed to remove orphaned blob");
                }
                Err(e)
            }
        }
    }

    /// Get a file owned by `owner`.
    pub async fn get_file(&self, owner: i64, id: i64) -> Result<FileMetadata> {
        self.repo()
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| FilenestError::NotFound("file".to_string()))
    }

    /// Get the file of `owner` stored under a blob reference.
    pub async fn get_file_by_blob_ref(&self, owner: i64, blob_ref: &str) -> Result<FileMetadata> {
        self.repo()
            .get_by_blob_ref(owner, blob_ref)
            .await?
            .ok_or_else(|| FilenestError::NotFound("file".to_string()))
    }

    /// List files directly inside a folder (None = root).
    pub async fn list_files(&self, owner: i64, folder: Option<i64>) -> Result<Vec<FileMetadata>> {
        if let Some(folder_id) = folder {
            FolderRepository::new(self.db.pool())
                .get_by_id(owner, folder_id)
                .await?
                .ok_or_else(|| FilenestError::NotFound("folder".to_string()))?;
        }
        self.repo().list_by_folder(owner, folder).await
    }

    /// Delete a file and its blob.
    ///
    /// The blob goes first. If the provider fails the metadata is kept and
    /// `Upstream` is returned; a blob that is already gone counts as deleted.
    pub async fn delete_file(&self, owner: i64, id: i64) -> Result<FileMetadata> {
        let file = self.get_file(owner, id).await?;

        if !file.blob_ref.is_empty() {
            match self.blobs.delete(&file.blob_ref).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(file_id = id, blob_ref = %file.blob_ref, "Blob already absent");
                }
                Err(e) => {
                    warn!(user_id = owner, file_id = id, error = %e, "Blob delete failed, keeping file");
                    return Err(e.into());
                }
            }
        }

        if !self.repo().delete(owner, id).await? {
            return Err(FilenestError::NotFound("file".to_string()));
        }

        info!(user_id = owner, file_id = id, "File deleted");
        Ok(file)
    }

    /// Attachment download link for a file.
    pub fn download_url(&self, file: &FileMetadata) -> String {
        self.blobs.download_url(&file.blob_ref)
    }
}
