//! Folder mutation handlers.
//!
//! Every handler answers with a `303 See Other` to the listing the user
//! should look at next.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};

use crate::web::dto::{folder_url, CreateFolderForm, MoveFolderForm, RenameFolderForm, ValidatedForm};
use crate::web::error::ApiError;
use crate::web::middleware::CurrentUser;

use super::AppState;

/// POST /create-folder - Create a root-level folder.
#[utoipa::path(
    post,
    path = "/create-folder",
    tag = "folders",
    request_body(content = CreateFolderForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirect to /homepage"),
        (status = 400, description = "Invalid folder name")
    )
)]
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedForm(form): ValidatedForm<CreateFolderForm>,
) -> Result<Redirect, ApiError> {
    state
        .folders()
        .create_folder(user.id, &form.folder_name, None)
        .await?;
    Ok(Redirect::to(&folder_url(None)))
}

/// POST /create-folder/folder/:id - Create a subfolder.
#[utoipa::path(
    post,
    path = "/create-folder/folder/{id}",
    tag = "folders",
    params(("id" = i64, Path, description = "Parent folder ID")),
    request_body(content = CreateFolderForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirect to the parent folder"),
        (status = 400, description = "Invalid folder name"),
        (status = 404, description = "Parent folder not found")
    )
)]
pub async fn create_subfolder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(parent_id): Path<i64>,
    ValidatedForm(form): ValidatedForm<CreateFolderForm>,
) -> Result<Redirect, ApiError> {
    state
        .folders()
        .create_folder(user.id, &form.folder_name, Some(parent_id))
        .await?;
    Ok(Redirect::to(&folder_url(Some(parent_id))))
}

/// POST /update/folder/:id - Rename a folder.
#[utoipa::path(
    post,
    path = "/update/folder/{id}",
    tag = "folders",
    params(("id" = i64, Path, description = "Folder ID")),
    request_body(content = RenameFolderForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Renamed; redirect to the parent folder"),
        (status = 400, description = "Invalid folder name"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ValidatedForm(form): ValidatedForm<RenameFolderForm>,
) -> Result<Redirect, ApiError> {
    let folder = state
        .folders()
        .rename_folder(user.id, id, &form.new_name)
        .await?;
    Ok(Redirect::to(&folder_url(folder.parent_id)))
}

/// POST /move/folder/:id - Move a folder under another parent.
#[utoipa::path(
    post,
    path = "/move/folder/{id}",
    tag = "folders",
    params(("id" = i64, Path, description = "Folder ID")),
    request_body(content = MoveFolderForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Moved; redirect to the new parent folder"),
        (status = 400, description = "Malformed parent id"),
        (status = 404, description = "Folder or parent not found"),
        (status = 409, description = "Target is the folder itself or a descendant")
    )
)]
pub async fn move_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<MoveFolderForm>,
) -> Result<Redirect, ApiError> {
    let target = form
        .target()
        .map_err(|_| ApiError::bad_request("parentId must be a folder id or empty"))?;

    let folder = state.folders().move_folder(user.id, id, target).await?;
    Ok(Redirect::to(&folder_url(folder.parent_id)))
}

/// POST /delete/folder/:id - Delete an empty folder.
#[utoipa::path(
    post,
    path = "/delete/folder/{id}",
    tag = "folders",
    params(("id" = i64, Path, description = "Folder ID")),
    responses(
        (status = 303, description = "Deleted; redirect to the parent folder"),
        (status = 404, description = "Folder not found"),
        (status = 409, description = "Folder is not empty")
    )
)]
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    let parent = state.folders().delete_folder(user.id, id).await?;
    Ok(Redirect::to(&folder_url(parent)))
}
