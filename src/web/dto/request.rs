//! Request DTOs for the filenest web layer.
//!
//! Form field names follow the browser forms (`folderName`, `newName`,
//! `confirm-password`, ...), so most fields carry a serde rename.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::file::{SortKey, SortOrder, MAX_FOLDER_NAME_LENGTH};
use crate::web::error::ApiError;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Log-in form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "confirm-password", default)]
    pub confirm_password: String,
}

/// `?next=` on the log-in routes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextQuery {
    /// Path to return to after signing in.
    pub next: Option<String>,
}

/// `?download=1` on blob links.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Any value asks for an attachment instead of inline display.
    pub download: Option<String>,
}

/// Sorting options for folder listings.
///
/// Values are kept raw and parsed by [`ListingQuery::key`] and
/// [`ListingQuery::order`] so a bad value gets the JSON error envelope.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// `name` or `createdAt`. Defaults to `name`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`, case-insensitive. Defaults depend on the sort key.
    pub order: Option<String>,
}

impl ListingQuery {
    /// Sort key, defaulting to name.
    pub fn key(&self) -> Result<SortKey, ApiError> {
        match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => Ok(SortKey::default()),
            Some(raw) => raw.parse().map_err(|_| {
                ApiError::bad_request(format!("sortBy must be name or createdAt, got {raw:?}"))
            }),
        }
    }

    /// Sort direction, or None to use the key's default.
    pub fn order(&self) -> Result<Option<SortOrder>, ApiError> {
        match self.order.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("order must be asc or desc, got {raw:?}"))),
        }
    }
}

/// Create folder form.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFolderForm {
    #[serde(rename = "folderName", default)]
    #[validate(
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars"),
        length(max = 100, message = "Folder name is too long")
    )]
    pub folder_name: String,
}

/// Rename folder form.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameFolderForm {
    #[serde(rename = "newName", default)]
    #[validate(
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars"),
        length(max = 100, message = "Folder name is too long")
    )]
    pub new_name: String,
}

/// Move folder form. An empty `parentId` moves the folder to the root.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveFolderForm {
    #[serde(rename = "parentId", default)]
    pub parent_id: String,
}

impl MoveFolderForm {
    /// Parse the target parent. `Ok(None)` means the root.
    pub fn target(&self) -> Result<Option<i64>, std::num::ParseIntError> {
        let raw = self.parent_id.trim();
        if raw.is_empty() {
            Ok(None)
        } else {
            raw.parse().map(Some)
        }
    }
}
