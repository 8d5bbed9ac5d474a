//! File handlers: upload, details and deletion.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, header::REFERER, HeaderMap, StatusCode},
    response::{Redirect, Response},
    Json,
};

use crate::file::{BlobError, FileMetadata, UploadRequest};
use crate::web::dto::{folder_url, ApiResponse, DownloadQuery, FileDetailsResponse, FileResponse};
use crate::web::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::FilenestError;

use super::auth::HOME_PATH;
use super::AppState;

/// POST /upload - Upload a root-level file.
///
/// Request body: multipart/form-data with a "file" field.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(content = String, content_type = "multipart/form-data", description = "Field `file`"),
    responses(
        (status = 303, description = "Uploaded; redirect to /homepage"),
        (status = 400, description = "No file chosen or invalid filename"),
        (status = 413, description = "File too large"),
        (status = 502, description = "File upload failed")
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    store_upload(&state, user.id, None, multipart).await?;
    Ok(Redirect::to(&folder_url(None)))
}

/// POST /upload/folder/:id - Upload a file into a folder.
#[utoipa::path(
    post,
    path = "/upload/folder/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "Folder ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Field `file`"),
    responses(
        (status = 303, description = "Uploaded; redirect to the folder"),
        (status = 400, description = "No file chosen or invalid filename"),
        (status = 404, description = "Folder not found"),
        (status = 413, description = "File too large"),
        (status = 502, description = "File upload failed")
    )
)]
pub async fn upload_file_to_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    store_upload(&state, user.id, Some(folder_id), multipart).await?;
    Ok(Redirect::to(&folder_url(Some(folder_id))))
}

async fn store_upload(
    state: &AppState,
    owner: i64,
    folder_id: Option<i64>,
    mut multipart: Multipart,
) -> Result<FileMetadata, ApiError> {
    let mut upload: Option<UploadRequest> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(state.max_upload_size)
        } else {
            ApiError::bad_request("Invalid multipart data")
        }
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = match field.content_type() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string(),
        };
        let content = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read file content: {}", e);
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(state.max_upload_size)
            } else {
                ApiError::bad_request("Failed to read file")
            }
        })?;

        upload = Some(
            UploadRequest::new(filename, content.to_vec())
                .in_folder(folder_id)
                .with_content_type(content_type),
        );
    }

    // Browsers send an empty, unnamed part when no file was picked.
    let upload = match upload {
        Some(upload) if !upload.filename.is_empty() => upload,
        _ => return Err(ApiError::bad_request("No file chosen")),
    };

    if upload.content.len() as u64 > state.max_upload_size {
        return Err(too_large(state.max_upload_size));
    }

    state.files().upload(owner, upload).await.map_err(|e| match e {
        FilenestError::Upstream(_) => ApiError::bad_gateway("File upload failed"),
        other => ApiError::from(other),
    })
}

fn too_large(max_bytes: u64) -> ApiError {
    ApiError::payload_too_large(format!(
        "File too large (max {}MB)",
        max_bytes / 1024 / 1024
    ))
}

/// GET /homepage/file/:id - File details with a download link.
#[utoipa::path(
    get,
    path = "/homepage/file/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File details", body = FileDetailsResponse),
        (status = 303, description = "Not signed in; redirect to /log-in"),
        (status = 404, description = "File not found")
    )
)]
pub async fn file_details(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileDetailsResponse>>, ApiError> {
    let files = state.files();
    let file = files.get_file(user.id, id).await?;

    Ok(Json(ApiResponse::new(FileDetailsResponse {
        download_url: files.download_url(&file),
        folder_url: folder_url(file.folder_id),
        file: FileResponse::from(&file),
    })))
}

/// GET /blobs/:blob_ref - Serve a blob kept on local disk.
///
/// Only the owner of the file stored under `blob_ref` may fetch it.
#[utoipa::path(
    get,
    path = "/blobs/{blob_ref}",
    tag = "files",
    params(
        ("blob_ref" = String, Path, description = "Blob reference"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 303, description = "Not signed in; redirect to /log-in"),
        (status = 404, description = "Blob not found")
    )
)]
pub async fn download_blob(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(blob_ref): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let local = state
        .blobs
        .as_local()
        .ok_or_else(|| ApiError::not_found("Blob not found"))?;

    let file = state.files().get_file_by_blob_ref(user.id, &blob_ref).await?;

    let content = local.load(&blob_ref).await.map_err(|e| match e {
        BlobError::NotFound(_) => ApiError::not_found("Blob not found"),
        other => {
            tracing::error!(file_id = file.id, "Failed to load blob: {}", other);
            ApiError::internal("Failed to load file")
        }
    })?;

    let content_type = mime_guess::from_path(&file.name)
        .first_or_octet_stream()
        .to_string();
    let disposition = if query.download.is_some() {
        content_disposition_header("attachment", &file.name)
    } else {
        content_disposition_header("inline", &file.name)
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// Build a Content-Disposition value, with an RFC 5987 `filename*` for
/// names that are not plain ASCII.
fn content_disposition_header(kind: &str, filename: &str) -> String {
    let plain = filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');
    if plain {
        return format!("{}; filename=\"{}\"", kind, filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' || !c.is_ascii() { '_' } else { c })
        .collect();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        kind,
        fallback,
        urlencoding::encode(filename)
    )
}

/// POST /delete/file/:id - Delete a file and its blob.
#[utoipa::path(
    post,
    path = "/delete/file/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 303, description = "Deleted; redirect back to the referring page"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Blob deletion failed; file kept")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Redirect, ApiError> {
    let file = state
        .files()
        .delete_file(user.id, id)
        .await
        .map_err(|e| match e {
            FilenestError::Upstream(_) => ApiError::bad_gateway("File deletion failed"),
            other => ApiError::from(other),
        })?;

    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    Ok(Redirect::to(&redirect_back(referer, &file)))
}

/// Local path and query of the referring page.
///
/// The deleted file's own details page is replaced by its folder.
fn redirect_back(referer: Option<&str>, deleted: &FileMetadata) -> String {
    let Some(url) = referer.and_then(|r| url::Url::parse(r).ok()) else {
        return HOME_PATH.to_string();
    };

    if url.path() == format!("/homepage/file/{}", deleted.id) {
        return folder_url(deleted.folder_id);
    }

    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(id: i64, folder_id: Option<i64>) -> FileMetadata {
        FileMetadata {
            id,
            user_id: 1,
            folder_id,
            name: "report.pdf".to_string(),
            size: 10,
            path: "homepage/report.pdf".to_string(),
            blob_url: "/blobs/x".to_string(),
            blob_ref: "x".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("attachment", "report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition_header("inline", "résumé \"v2\".pdf");
        assert!(value.starts_with("inline; filename=\"r_sum_ _v2_.pdf\""));
        assert!(value.contains("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22.pdf"));
    }

    #[test]
    fn test_redirect_back_uses_referer_path() {
        let f = file(9, Some(3));
        assert_eq!(
            redirect_back(Some("http://localhost:3000/homepage/folder/3?sortBy=name"), &f),
            "/homepage/folder/3?sortBy=name"
        );
    }

    #[test]
    fn test_redirect_back_without_referer() {
        let f = file(9, None);
        assert_eq!(redirect_back(None, &f), "/homepage");
        assert_eq!(redirect_back(Some("not a url"), &f), "/homepage");
    }

    #[test]
    fn test_redirect_back_from_details_page() {
        let f = file(9, Some(3));
        assert_eq!(
            redirect_back(Some("http://localhost:3000/homepage/file/9"), &f),
            "/homepage/folder/3"
        );
    }

    #[test]
    fn test_redirect_back_drops_foreign_host() {
        let f = file(9, None);
        assert_eq!(
            redirect_back(Some("https://evil.example/phish"), &f),
            "/phish"
        );
    }
}
