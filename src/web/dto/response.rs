//! Response DTOs for the filenest web layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::User;
use crate::file::{
    format_file_size, Entry, FileMetadata, Folder, FolderPath, PathEntry, SortKey, SortOrder,
    ROOT_PATH_ID,
};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Landing page for signed-out visitors.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryPageResponse {
    pub app: String,
    pub log_in_url: String,
    pub sign_up_url: String,
}

impl Default for EntryPageResponse {
    fn default() -> Self {
        Self {
            app: env!("CARGO_PKG_NAME").to_string(),
            log_in_url: "/log-in".to_string(),
            sign_up_url: "/sign-up".to_string(),
        }
    }
}

/// Description of a form page (`/log-in`, `/sign-up`).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormPageResponse {
    /// Form name.
    pub form: String,
    /// Where the form posts to.
    pub action: String,
    /// Field names the form expects.
    pub fields: Vec<String>,
    /// Return path after a successful log-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl FormPageResponse {
    /// Log-in form, carrying the return path.
    pub fn log_in(next: Option<String>) -> Self {
        let action = match &next {
            Some(next) => format!("/log-in?next={}", urlencoding::encode(next)),
            None => "/log-in".to_string(),
        };
        Self {
            form: "log-in".to_string(),
            action,
            fields: vec!["username".to_string(), "password".to_string()],
            next,
        }
    }

    /// Sign-up form.
    pub fn sign_up() -> Self {
        Self {
            form: "sign-up".to_string(),
            action: "/sign-up".to_string(),
            fields: vec![
                "username".to_string(),
                "password".to_string(),
                "confirm-password".to_string(),
            ],
            next: None,
        }
    }
}

/// Signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

// ============================================================================
// Folders and files
// ============================================================================

/// Folder in responses.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderResponse {
    pub id: i64,
    /// Stored (HTML-escaped) name.
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Listing URL of this folder.
    pub url: String,
}

impl From<&Folder> for FolderResponse {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            parent_id: folder.parent_id,
            created_at: folder.created_at,
            url: folder_url(Some(folder.id)),
        }
    }
}

/// File in responses.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub folder_id: Option<i64>,
    /// Size in bytes.
    pub size: i64,
    /// Human readable size, e.g. `1.5 KB`.
    pub size_display: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Details URL of this file.
    pub url: String,
}

impl From<&FileMetadata> for FileResponse {
    fn from(file: &FileMetadata) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            folder_id: file.folder_id,
            size: file.size,
            size_display: format_file_size(file.size),
            path: file.path.clone(),
            created_at: file.created_at,
            url: format!("/homepage/file/{}", file.id),
        }
    }
}

/// One listing item.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryResponse {
    Folder(FolderResponse),
    File(FileResponse),
}

impl From<&Entry> for EntryResponse {
    fn from(entry: &Entry) -> Self {
        match entry {
            Entry::Folder(folder) => EntryResponse::Folder(folder.into()),
            Entry::File(file) => EntryResponse::File(file.into()),
        }
    }
}

/// One breadcrumb.
#[derive(Debug, Serialize, ToSchema)]
pub struct PathEntryResponse {
    /// Folder id, or `homepage-root` for the root sentinel.
    pub id: String,
    pub name: String,
    pub url: String,
}

impl From<&PathEntry> for PathEntryResponse {
    fn from(entry: &PathEntry) -> Self {
        match entry {
            PathEntry::Root => Self {
                id: ROOT_PATH_ID.to_string(),
                name: entry.name().to_string(),
                url: folder_url(None),
            },
            PathEntry::Folder { id, name } => Self {
                id: id.to_string(),
                name: name.clone(),
                url: folder_url(Some(*id)),
            },
        }
    }
}

/// Folder listing page (`/homepage`, `/homepage/folder/:id`).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub user: UserInfo,
    /// Folder being listed; absent for the root.
    pub folder: Option<FolderResponse>,
    /// Breadcrumbs from the root down to the listed folder's parent.
    pub path: Vec<PathEntryResponse>,
    /// Whether leading breadcrumbs were cut off.
    pub path_truncated: bool,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub entries: Vec<EntryResponse>,
}

impl ListingResponse {
    /// Build a listing page from its parts.
    pub fn new(
        user: &User,
        folder: Option<&Folder>,
        path: &FolderPath,
        sort_by: SortKey,
        order: SortOrder,
        entries: &[Entry],
    ) -> Self {
        Self {
            user: user.into(),
            folder: folder.map(FolderResponse::from),
            path: path.entries().iter().map(PathEntryResponse::from).collect(),
            path_truncated: path.is_truncated(),
            sort_by,
            order,
            entries: entries.iter().map(EntryResponse::from).collect(),
        }
    }
}

/// File details page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailsResponse {
    pub file: FileResponse,
    /// Attachment URL served by the blob store.
    pub download_url: String,
    /// Listing URL of the containing folder.
    pub folder_url: String,
}

/// Listing URL of a folder, or of the root for `None`.
pub fn folder_url(folder_id: Option<i64>) -> String {
    match folder_id {
        Some(id) => format!("/homepage/folder/{}", id),
        None => "/homepage".to_string(),
    }
}
