//! Folder listing handlers (`/homepage`).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::db::User;
use crate::file::{Folder, FolderPath};
use crate::web::dto::{ApiResponse, ListingQuery, ListingResponse};
use crate::web::error::ApiError;
use crate::web::middleware::CurrentUser;

use super::AppState;

/// GET /homepage - Root listing.
#[utoipa::path(
    get,
    path = "/homepage",
    tag = "folders",
    params(ListingQuery),
    responses(
        (status = 200, description = "Root folders and files", body = ListingResponse),
        (status = 400, description = "Unknown sortBy or order"),
        (status = 303, description = "Not signed in; redirect to /log-in")
    )
)]
pub async fn homepage(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ApiResponse<ListingResponse>>, ApiError> {
    let listing = build_listing(&state, &user, None, &query).await?;
    Ok(Json(ApiResponse::new(listing)))
}

/// GET /homepage/folder/:id - Folder listing with breadcrumbs.
#[utoipa::path(
    get,
    path = "/homepage/folder/{id}",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID"),
        ListingQuery
    ),
    responses(
        (status = 200, description = "Folder contents", body = ListingResponse),
        (status = 400, description = "Unknown sortBy or order"),
        (status = 303, description = "Not signed in; redirect to /log-in"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn folder_view(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ApiResponse<ListingResponse>>, ApiError> {
    let folder = state.folders().get_folder(user.id, id).await?;
    let listing = build_listing(&state, &user, Some(&folder), &query).await?;
    Ok(Json(ApiResponse::new(listing)))
}

async fn build_listing(
    state: &AppState,
    user: &User,
    folder: Option<&Folder>,
    query: &ListingQuery,
) -> Result<ListingResponse, ApiError> {
    let key = query.key()?;
    let order = query.order()?.unwrap_or(key.default_order());
    let folder_id = folder.map(|f| f.id);
    tracing::debug!(user_id = user.id, folder_id = ?folder_id, sort_by = %key, order = %order, "Listing folder");

    let entries = state
        .lister()
        .list_contents(user.id, folder_id, key, Some(order))
        .await?;

    let mut path = match folder_id {
        Some(id) => state.folders().get_folder_path(user.id, id).await?,
        None => FolderPath::new(&[]),
    };
    if let Some(levels) = state.breadcrumb_levels {
        path = path.truncate(levels);
    }

    Ok(ListingResponse::new(user, folder, &path, key, order, &entries))
}
