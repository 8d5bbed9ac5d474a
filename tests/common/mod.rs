//! Test helpers for the HTTP integration tests.
//!
//! Provides an in-memory application, sign-up/log-in helpers and a blob
//! store double whose provider calls can be made to fail.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use tempfile::TempDir;

use filenest::db::UserRepository;
use filenest::file::{BlobError, BlobStore, LocalBlobStore, StoredBlob};
use filenest::web::{create_router, AppState};
use filenest::Database;

/// Password that satisfies every sign-up rule.
pub const PASSWORD: &str = "Secret123!";

/// A running application backed by an in-memory database.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    _blob_dir: TempDir,
}

/// A signed-in user.
pub struct Session {
    pub user_id: i64,
    /// Value for the `Cookie` request header.
    pub cookie: String,
}

/// Start an application with a local blob store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|dir| Arc::new(FlakyBlobStore::new(dir))).await
}

/// Start an application with a custom blob store rooted in a temp dir.
pub async fn spawn_app_with<F>(make_store: F) -> TestApp
where
    F: FnOnce(&Path) -> Arc<dyn BlobStore>,
{
    build_app(make_store, |state| state).await
}

/// Start an application with adjusted state settings.
pub async fn spawn_app_with_state<G>(configure: G) -> TestApp
where
    G: FnOnce(AppState) -> AppState,
{
    build_app(|dir| Arc::new(FlakyBlobStore::new(dir)), configure).await
}

async fn build_app<F, G>(make_store: F, configure: G) -> TestApp
where
    F: FnOnce(&Path) -> Arc<dyn BlobStore>,
    G: FnOnce(AppState) -> AppState,
{
    let blob_dir = TempDir::new().expect("Failed to create blob dir");
    let blobs = make_store(blob_dir.path());

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );

    let state = AppState::new(db.clone(), blobs, "test-secret-key-for-testing-only")
        .with_max_upload_size(1024 * 1024);
    let router = create_router(Arc::new(configure(state)), &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        _blob_dir: blob_dir,
    }
}

impl TestApp {
    /// Register a user through the sign-up form.
    pub async fn sign_up(&self, username: &str) -> TestResponse {
        self.server
            .post("/sign-up")
            .form(&[
                ("username", username),
                ("password", PASSWORD),
                ("confirm-password", PASSWORD),
            ])
            .await
    }

    /// Submit the log-in form.
    pub async fn log_in(&self, username: &str, password: &str) -> TestResponse {
        self.server
            .post("/log-in")
            .form(&[("username", username), ("password", password)])
            .await
    }

    /// Sign up and log in, returning the session.
    pub async fn signed_in(&self, username: &str) -> Session {
        self.sign_up(username)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = self.log_in(username, PASSWORD).await;
        response.assert_status(StatusCode::SEE_OTHER);

        let user_id = UserRepository::new(self.db.pool())
            .get_by_username(username)
            .await
            .expect("Failed to look up user")
            .expect("User missing after sign-up")
            .id;

        Session {
            user_id,
            cookie: session_cookie(&response),
        }
    }
}

/// `name=value` part of the session cookie set by a response.
pub fn session_cookie(response: &TestResponse) -> String {
    response
        .headers()
        .get(SET_COOKIE)
        .expect("No Set-Cookie header")
        .to_str()
        .expect("Set-Cookie is not ASCII")
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Target of a redirect response.
pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("No Location header")
        .to_str()
        .expect("Location is not ASCII")
        .to_string()
}

/// Local blob store whose uploads or deletions can be made to fail.
pub struct FlakyBlobStore {
    inner: LocalBlobStore,
    fail_put: bool,
    fail_delete: bool,
}

impl FlakyBlobStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            inner: LocalBlobStore::new(dir, "/blobs").expect("Failed to create blob store"),
            fail_put: false,
            fail_delete: false,
        }
    }

    /// Every upload fails as if the provider were down.
    pub fn failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    /// Every deletion fails as if the provider were down.
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredBlob, BlobError> {
        if self.fail_put {
            return Err(BlobError::Http("503 Service Unavailable".to_string()));
        }
        self.inner.put(filename, content_type, data).await
    }

    async fn delete(&self, blob_ref: &str) -> Result<bool, BlobError> {
        if self.fail_delete {
            return Err(BlobError::Http("503 Service Unavailable".to_string()));
        }
        self.inner.delete(blob_ref).await
    }

    fn download_url(&self, blob_ref: &str) -> String {
        self.inner.download_url(blob_ref)
    }

    fn name(&self) -> &'static str {
        "flaky"
    }

    fn as_local(&self) -> Option<&LocalBlobStore> {
        Some(&self.inner)
    }
}
