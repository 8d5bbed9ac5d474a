//! Authentication handlers and shared application state.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::{
    authenticate, register, LoginError, RegistrationError, RegistrationRequest, SessionManager,
    DEFAULT_SESSION_DURATION_SECS, USERNAME_TAKEN_MESSAGE,
};
use crate::config::Config;
use crate::db::UserRepository;
use crate::file::{BlobStore, ContentLister, FileService, FolderService, DEFAULT_MAX_FILE_SIZE};
use crate::web::dto::{
    ApiResponse, EntryPageResponse, FormPageResponse, LoginForm, NextQuery, SignupForm,
};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::middleware::MaybeUser;
use crate::Database;

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "filenest_sid";

/// Where signed-in users land.
pub const HOME_PATH: &str = "/homepage";

/// Application state shared across handlers.
pub struct AppState {
    /// Database handle.
    pub db: Arc<Database>,
    /// Blob store for file content.
    pub blobs: Arc<dyn BlobStore>,
    /// Pepper for stored session token hashes.
    pub session_secret: String,
    /// Session lifetime.
    pub session_ttl: Duration,
    /// Session cookie name.
    pub cookie_name: String,
    /// Set the `Secure` flag on the session cookie.
    pub secure_cookies: bool,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Breadcrumb levels shown in folder views (None = all).
    pub breadcrumb_levels: Option<usize>,
}

impl AppState {
    /// Create a new application state with default settings.
    pub fn new(
        db: Arc<Database>,
        blobs: Arc<dyn BlobStore>,
        session_secret: impl Into<String>,
    ) -> Self {
        Self {
            db,
            blobs,
            session_secret: session_secret.into(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_DURATION_SECS),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookies: false,
            max_upload_size: DEFAULT_MAX_FILE_SIZE,
            breadcrumb_levels: None,
        }
    }

    /// Create the state described by a configuration.
    pub fn from_config(db: Arc<Database>, blobs: Arc<dyn BlobStore>, config: &Config) -> Self {
        Self::new(db, blobs, config.web.session_secret.clone())
            .with_session_ttl(Duration::from_secs(config.web.session_ttl_hours * 3600))
            .with_cookie_name(config.web.session_cookie_name.clone())
            .with_secure_cookies(config.web.secure_cookies)
            .with_max_upload_size(config.files.max_upload_bytes())
            .with_breadcrumb_levels(config.web.breadcrumb_levels)
    }

    /// Set the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the session cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the `Secure` cookie flag.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Limit breadcrumbs to the given number of levels.
    pub fn with_breadcrumb_levels(mut self, levels: Option<usize>) -> Self {
        self.breadcrumb_levels = levels;
        self
    }

    /// Session manager bound to this state.
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(self.db.pool(), &self.session_secret).with_ttl(self.session_ttl)
    }

    /// Folder service bound to this state.
    pub fn folders(&self) -> FolderService<'_> {
        FolderService::new(&self.db)
    }

    /// File service bound to this state.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(&self.db, self.blobs.as_ref()).with_max_file_size(self.max_upload_size)
    }

    /// Content lister bound to this state.
    pub fn lister(&self) -> ContentLister<'_> {
        ContentLister::new(&self.db)
    }

    /// Session cookie carrying `token`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }

    /// Cookie used to clear the session cookie.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone()).path("/").build()
    }
}

/// Accept only local absolute paths as a post-login destination.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => HOME_PATH.to_string(),
    }
}

/// GET / - Landing page.
#[utoipa::path(
    get,
    path = "/",
    tag = "auth",
    responses(
        (status = 200, description = "Landing page", body = EntryPageResponse),
        (status = 303, description = "Signed in; redirect to /homepage")
    )
)]
pub async fn index(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Redirect::to(HOME_PATH).into_response(),
        None => Json(ApiResponse::new(EntryPageResponse::default())).into_response(),
    }
}

/// GET /log-in - Log-in form.
#[utoipa::path(
    get,
    path = "/log-in",
    tag = "auth",
    params(NextQuery),
    responses(
        (status = 200, description = "Log-in form", body = FormPageResponse),
        (status = 303, description = "Already signed in")
    )
)]
pub async fn login_page(MaybeUser(user): MaybeUser, Query(query): Query<NextQuery>) -> Response {
    match user {
        Some(_) => Redirect::to(&safe_next(query.next.as_deref())).into_response(),
        None => Json(ApiResponse::new(FormPageResponse::log_in(query.next))).into_response(),
    }
}

/// POST /log-in - Check credentials and start a session.
#[utoipa::path(
    post,
    path = "/log-in",
    tag = "auth",
    params(NextQuery),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in; redirect to next or /homepage"),
        (status = 401, description = "Incorrect username or password")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = authenticate(&repo, &form.username, &form.password)
        .await
        .map_err(|e| match e {
            LoginError::UnknownUser => field_error(ErrorCode::Unauthorized, "username", &e),
            LoginError::WrongPassword => field_error(ErrorCode::Unauthorized, "password", &e),
            LoginError::Database(msg) => {
                tracing::error!("Login lookup failed: {}", msg);
                ApiError::internal("An internal error occurred")
            }
        })?;

    let session = state.sessions().create(user.id).await.map_err(|e| {
        tracing::error!(user_id = user.id, "Failed to create session: {}", e);
        ApiError::internal("Failed to start session")
    })?;

    let jar = jar.add(state.session_cookie(session.token));
    Ok((jar, Redirect::to(&safe_next(query.next.as_deref()))))
}

/// GET /sign-up - Sign-up form.
#[utoipa::path(
    get,
    path = "/sign-up",
    tag = "auth",
    responses(
        (status = 200, description = "Sign-up form", body = FormPageResponse),
        (status = 303, description = "Already signed in")
    )
)]
pub async fn signup_page(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Redirect::to(HOME_PATH).into_response(),
        None => Json(ApiResponse::new(FormPageResponse::sign_up())).into_response(),
    }
}

/// POST /sign-up - Register a new account.
#[utoipa::path(
    post,
    path = "/sign-up",
    tag = "auth",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered; redirect to /log-in"),
        (status = 400, description = "Field validation failed"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Redirect, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let request = RegistrationRequest::new(form.username, form.password, form.confirm_password);

    match register(&repo, request).await {
        Ok(_) => Ok(Redirect::to("/log-in")),
        Err(e @ RegistrationError::Validation(_)) => Err(ApiError::validation(
            e.field_errors().unwrap_or_default(),
        )),
        Err(e @ RegistrationError::UsernameExists) => Err(ApiError::with_details(
            ErrorCode::Conflict,
            USERNAME_TAKEN_MESSAGE,
            e.field_errors().unwrap_or_default(),
        )),
        Err(e) => {
            tracing::error!("Registration failed: {}", e);
            Err(ApiError::internal("Registration failed"))
        }
    }
}

/// GET /log-out - End the session.
#[utoipa::path(
    get,
    path = "/log-out",
    tag = "auth",
    responses(
        (status = 303, description = "Signed out; redirect to /")
    )
)]
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(&state.cookie_name) {
        if let Err(e) = state.sessions().destroy(cookie.value()).await {
            tracing::warn!(error = %e, "Failed to destroy session");
        }
    }

    (jar.remove(state.removal_cookie()), Redirect::to("/"))
}

fn field_error(code: ErrorCode, field: &str, err: &LoginError) -> ApiError {
    let message = err.to_string();
    ApiError::with_details(
        code,
        message.clone(),
        [(field.to_string(), vec![message])].into_iter().collect(),
    )
}
