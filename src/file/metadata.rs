//! File metadata types and repository.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db::DbPool;
use crate::{FilenestError, Result};

pub(crate) const FILE_COLUMNS: &str =
    "id, user_id, folder_id, name, size, path, blob_url, blob_ref, created_at";

/// Metadata of an uploaded file. The content lives in the blob store.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FileMetadata {
    /// Unique file ID.
    pub id: i64,
    /// Owner.
    pub user_id: i64,
    /// Containing folder (None for root-level files).
    pub folder_id: Option<i64>,
    /// Original filename.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Informational logical path (`homepage/<folderId>/<name>`).
    pub path: String,
    /// Public URL of the blob.
    pub blob_url: String,
    /// Blob store reference used for deletion.
    pub blob_ref: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for recording a new file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Owner.
    pub user_id: i64,
    /// Containing folder.
    pub folder_id: Option<i64>,
    /// Original filename.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Logical path.
    pub path: String,
    /// Public URL of the blob.
    pub blob_url: String,
    /// Blob store reference.
    pub blob_ref: String,
}

impl NewFile {
    /// Create a root-level file record; the logical path is derived.
    pub fn new(
        user_id: i64,
        name: impl Into<String>,
        size: i64,
        blob_url: impl Into<String>,
        blob_ref: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            user_id,
            folder_id: None,
            path: logical_path(None, &name),
            name,
            size,
            blob_url: blob_url.into(),
            blob_ref: blob_ref.into(),
        }
    }

    /// Place the file inside a folder.
    pub fn in_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self.path = logical_path(folder_id, &self.name);
        self
    }
}

/// Logical path of a file: `homepage/<name>` or `homepage/<folderId>/<name>`.
pub fn logical_path(folder_id: Option<i64>, name: &str) -> String {
    match folder_id {
        Some(id) => format!("homepage/{id}/{name}"),
        None => format!("homepage/{name}"),
    }
}

/// Repository for file metadata.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert file metadata.
    pub async fn create(&self, file: &NewFile) -> Result<FileMetadata> {
        let created = sqlx::query_as::<_, FileMetadata>(&format!(
            "INSERT INTO files (user_id, folder_id, name, size, path, blob_url, blob_ref, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {FILE_COLUMNS}"
        ))
        .bind(file.user_id)
        .bind(file.folder_id)
        .bind(&file.name)
        .bind(file.size)
        .bind(&file.path)
        .bind(&file.blob_url)
        .bind(&file.blob_ref)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Get a file owned by `owner`.
    pub async fn get_by_id(&self, owner: i64, id: i64) -> Result<Option<FileMetadata>> {
        let file = sqlx::query_as::<_, FileMetadata>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Find the file of `owner` stored under a blob reference.
    pub async fn get_by_blob_ref(&self, owner: i64, blob_ref: &str) -> Result<Option<FileMetadata>> {
        let file = sqlx::query_as::<_, FileMetadata>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE blob_ref = $1 AND user_id = $2"
        ))
        .bind(blob_ref)
        .bind(owner)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(file)
    }

    /// List files directly inside `folder` (None = root level).
    pub async fn list_by_folder(
        &self,
        owner: i64,
        folder: Option<i64>,
    ) -> Result<Vec<FileMetadata>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_by_folder_in(&mut *conn, owner, folder).await
    }

    pub(crate) async fn list_by_folder_in(
        conn: &mut SqliteConnection,
        owner: i64,
        folder: Option<i64>,
    ) -> Result<Vec<FileMetadata>> {
        let files = sqlx::query_as::<_, FileMetadata>(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE user_id = $1 AND folder_id IS $2
             ORDER BY id"
        ))
        .bind(owner)
        .bind(folder)
        .fetch_all(conn)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Delete file metadata. Returns true if a row was removed.
    pub async fn delete(&self, owner: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool)
            .await
            .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count files directly inside a folder.
    pub async fn count_by_folder(&self, owner: i64, folder_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE user_id = $1 AND folder_id = $2")
                .bind(owner)
                .bind(folder_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(count)
    }
}
