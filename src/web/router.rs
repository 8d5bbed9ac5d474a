//! Router configuration for the web layer.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::dto;
use super::handlers::{self, AppState};
use super::middleware::{create_cors_layer, security_headers};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "filenest", description = "Multi-user file and folder storage"),
    paths(
        handlers::auth::index,
        handlers::auth::login_page,
        handlers::auth::login,
        handlers::auth::signup_page,
        handlers::auth::signup,
        handlers::auth::logout,
        handlers::home::homepage,
        handlers::home::folder_view,
        handlers::folder::create_folder,
        handlers::folder::create_subfolder,
        handlers::folder::rename_folder,
        handlers::folder::move_folder,
        handlers::folder::delete_folder,
        handlers::file::upload_file,
        handlers::file::upload_file_to_folder,
        handlers::file::file_details,
        handlers::file::download_blob,
        handlers::file::delete_file,
    ),
    components(schemas(
        dto::LoginForm,
        dto::SignupForm,
        dto::CreateFolderForm,
        dto::RenameFolderForm,
        dto::MoveFolderForm,
        dto::EntryPageResponse,
        dto::FormPageResponse,
        dto::UserInfo,
        dto::FolderResponse,
        dto::FileResponse,
        dto::EntryResponse,
        dto::PathEntryResponse,
        dto::ListingResponse,
        dto::FileDetailsResponse,
        crate::file::SortKey,
        crate::file::SortOrder,
    )),
    tags(
        (name = "auth", description = "Sign-up, log-in and sessions"),
        (name = "folders", description = "Folder tree and listings"),
        (name = "files", description = "File upload, details and deletion")
    )
)]
pub struct ApiDoc;

/// Create the main application router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let auth_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/log-in", get(handlers::login_page).post(handlers::login))
        .route("/sign-up", get(handlers::signup_page).post(handlers::signup))
        .route("/log-out", get(handlers::logout));

    let folder_routes = Router::new()
        .route("/homepage", get(handlers::homepage))
        .route("/homepage/folder/:id", get(handlers::folder_view))
        .route("/create-folder", post(handlers::create_folder))
        .route("/create-folder/folder/:id", post(handlers::create_subfolder))
        .route("/update/folder/:id", post(handlers::rename_folder))
        .route("/move/folder/:id", post(handlers::move_folder))
        .route("/delete/folder/:id", post(handlers::delete_folder));

    let file_routes = Router::new()
        .route("/upload", post(handlers::upload_file))
        .route("/upload/folder/:id", post(handlers::upload_file_to_folder))
        .route("/homepage/file/:id", get(handlers::file_details))
        .route("/blobs/:blob_ref", get(handlers::download_blob))
        .route("/delete/file/:id", post(handlers::delete_file))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .merge(auth_routes)
        .merge(folder_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
