//! Web Folder Tests
//!
//! Integration tests for folder listings, breadcrumbs and folder mutations.

mod common;

use axum::http::header::COOKIE;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

use common::{location, spawn_app, Session, TestApp};
use filenest::FolderService;

async fn create_folder(app: &TestApp, session: &Session, name: &str, parent: Option<i64>) -> i64 {
    FolderService::new(&app.db)
        .create_folder(session.user_id, name, parent)
        .await
        .expect("Failed to create folder")
        .id
}

async fn listing(app: &TestApp, session: &Session, url: &str) -> Value {
    let response = app
        .server
        .get(url)
        .add_header(COOKIE, session.cookie.clone())
        .await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

fn entry_names(listing: &Value) -> Vec<String> {
    listing["entries"]
        .as_array()
        .expect("entries is not an array")
        .iter()
        .map(|e| e["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_empty_homepage() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(data["user"]["username"], "alice");
    assert!(data["folder"].is_null());
    assert_eq!(data["sortBy"], "name");
    assert_eq!(data["order"], "asc");
    assert!(data["entries"].as_array().unwrap().is_empty());
    assert_eq!(data["path"][0]["id"], "homepage-root");
}

#[tokio::test]
async fn test_listing_sorted_by_name_mixes_folders_and_files() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    create_folder(&app, &session, "Zeta", None).await;
    create_folder(&app, &session, "alpha", None).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"hello".to_vec())
            .file_name("Beta.txt")
            .mime_type("text/plain"),
    );
    app.server
        .post("/upload")
        .add_header(COOKIE, session.cookie.clone())
        .multipart(form)
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let data = listing(&app, &session, "/homepage?sortBy=name").await;
    assert_eq!(data["sortBy"], "name");
    assert_eq!(data["order"], "asc");
    assert_eq!(entry_names(&data), vec!["alpha", "Beta.txt", "Zeta"]);
    assert_eq!(data["entries"][1]["kind"], "file");

    let data = listing(&app, &session, "/homepage?sortBy=name&order=desc").await;
    assert_eq!(entry_names(&data), vec!["Zeta", "Beta.txt", "alpha"]);

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["alpha", "Beta.txt", "Zeta"]);

    let data = listing(&app, &session, "/homepage?sortBy=createdAt&order=DESC").await;
    assert_eq!(data["sortBy"], "createdAt");
    assert_eq!(data["order"], "desc");
}

#[tokio::test]
async fn test_listing_rejects_unknown_sort_params() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    for url in ["/homepage?sortBy=size", "/homepage?order=sideways"] {
        let response = app
            .server
            .get(url)
            .add_header(COOKIE, session.cookie.clone())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_listing_only_shows_own_entries() {
    let app = spawn_app().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;

    create_folder(&app, &alice, "Private", None).await;

    let data = listing(&app, &bob, "/homepage").await;
    assert!(entry_names(&data).is_empty());
}

#[tokio::test]
async fn test_folder_view_of_other_user_is_not_found() {
    let app = spawn_app().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;

    let id = create_folder(&app, &alice, "Private", None).await;

    let response = app
        .server
        .get(&format!("/homepage/folder/{}", id))
        .add_header(COOKIE, bob.cookie)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nested_folder_breadcrumbs() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    let mut parent = None;
    let mut ids = Vec::new();
    for name in ["one", "two", "three", "four", "five"] {
        let id = create_folder(&app, &session, name, parent).await;
        ids.push(id);
        parent = Some(id);
    }

    let deepest = ids[4];
    let data = listing(&app, &session, &format!("/homepage/folder/{}", deepest)).await;

    assert_eq!(data["folder"]["name"], "five");
    assert_eq!(data["pathTruncated"], false);
    let path: Vec<&str> = data["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(path, vec!["homepage", "one", "two", "three", "four"]);
    assert_eq!(data["path"][1]["url"], format!("/homepage/folder/{}", ids[0]));
}

#[tokio::test]
async fn test_breadcrumbs_truncated_to_configured_levels() {
    let app = common::spawn_app_with_state(|state| state.with_breadcrumb_levels(Some(2))).await;
    let session = app.signed_in("alice").await;

    let mut parent = None;
    for name in ["one", "two", "three", "four"] {
        parent = Some(create_folder(&app, &session, name, parent).await);
    }

    let data = listing(&app, &session, &format!("/homepage/folder/{}", parent.unwrap())).await;
    assert_eq!(data["pathTruncated"], true);
    let path: Vec<&str> = data["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(path, vec!["two", "three"]);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_folder_at_root() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    let response = app
        .server
        .post("/create-folder")
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("folderName", "  Docs  ")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/homepage");

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["Docs"]);
    assert_eq!(data["entries"][0]["kind"], "folder");
}

#[tokio::test]
async fn test_create_folder_rejects_blank_name() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;

    let response = app
        .server
        .post("/create-folder")
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("folderName", "   ")])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let data = listing(&app, &session, "/homepage").await;
    assert!(entry_names(&data).is_empty());
}

#[tokio::test]
async fn test_create_subfolder_redirects_to_parent() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let parent = create_folder(&app, &session, "Docs", None).await;

    let response = app
        .server
        .post(&format!("/create-folder/folder/{}", parent))
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("folderName", "Invoices")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/homepage/folder/{}", parent));

    let data = listing(&app, &session, &format!("/homepage/folder/{}", parent)).await;
    assert_eq!(entry_names(&data), vec!["Invoices"]);
}

#[tokio::test]
async fn test_create_subfolder_in_other_users_folder() {
    let app = spawn_app().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let parent = create_folder(&app, &alice, "Docs", None).await;

    let response = app
        .server
        .post(&format!("/create-folder/folder/{}", parent))
        .add_header(COOKIE, bob.cookie)
        .form(&[("folderName", "Intruder")])
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_folder() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let id = create_folder(&app, &session, "Docs", None).await;

    let response = app
        .server
        .post(&format!("/update/folder/{}", id))
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("newName", "Documents")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/homepage");

    let data = listing(&app, &session, &format!("/homepage/folder/{}", id)).await;
    assert_eq!(data["folder"]["name"], "Documents");

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["Documents"]);
}

#[tokio::test]
async fn test_delete_empty_folder_redirects_to_parent() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let parent = create_folder(&app, &session, "Docs", None).await;
    let child = create_folder(&app, &session, "Old", Some(parent)).await;

    let response = app
        .server
        .post(&format!("/delete/folder/{}", child))
        .add_header(COOKIE, session.cookie.clone())
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/homepage/folder/{}", parent));

    let data = listing(&app, &session, &format!("/homepage/folder/{}", parent)).await;
    assert!(entry_names(&data).is_empty());
}

#[tokio::test]
async fn test_delete_non_empty_folder_is_conflict() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let parent = create_folder(&app, &session, "Docs", None).await;
    create_folder(&app, &session, "Inner", Some(parent)).await;

    let response = app
        .server
        .post(&format!("/delete/folder/{}", parent))
        .add_header(COOKIE, session.cookie.clone())
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        "Folder must be empty before it can be deleted"
    );

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["Docs"]);
}

#[tokio::test]
async fn test_delete_other_users_folder_is_not_found() {
    let app = spawn_app().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let id = create_folder(&app, &alice, "Docs", None).await;

    let response = app
        .server
        .post(&format!("/delete/folder/{}", id))
        .add_header(COOKIE, bob.cookie)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let data = listing(&app, &alice, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["Docs"]);
}

#[tokio::test]
async fn test_move_folder() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let docs = create_folder(&app, &session, "Docs", None).await;
    let archive = create_folder(&app, &session, "Archive", None).await;

    let response = app
        .server
        .post(&format!("/move/folder/{}", docs))
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("parentId", archive.to_string())])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/homepage/folder/{}", archive));

    let data = listing(&app, &session, &format!("/homepage/folder/{}", archive)).await;
    assert_eq!(entry_names(&data), vec!["Docs"]);

    // Empty parentId moves back to the root.
    let response = app
        .server
        .post(&format!("/move/folder/{}", docs))
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("parentId", "")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/homepage");
}

#[tokio::test]
async fn test_move_folder_into_descendant_is_rejected() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let top = create_folder(&app, &session, "Top", None).await;
    let middle = create_folder(&app, &session, "Middle", Some(top)).await;
    let bottom = create_folder(&app, &session, "Bottom", Some(middle)).await;

    let response = app
        .server
        .post(&format!("/move/folder/{}", top))
        .add_header(COOKIE, session.cookie.clone())
        .form(&[("parentId", bottom.to_string())])
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let data = listing(&app, &session, "/homepage").await;
    assert_eq!(entry_names(&data), vec!["Top"]);
    let data = listing(&app, &session, &format!("/homepage/folder/{}", bottom)).await;
    let path: Vec<&str> = data["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(path, vec!["homepage", "Top", "Middle"]);
}

#[tokio::test]
async fn test_move_folder_with_bad_parent_id() {
    let app = spawn_app().await;
    let session = app.signed_in("alice").await;
    let docs = create_folder(&app, &session, "Docs", None).await;

    let response = app
        .server
        .post(&format!("/move/folder/{}", docs))
        .add_header(COOKIE, session.cookie)
        .form(&[("parentId", "abc")])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
