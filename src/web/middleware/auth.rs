//! Cookie session extractors.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::SessionError;
use crate::db::User;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for signed-in users.
///
/// Requests without a live session are redirected to
/// `/log-in?next=<original path and query>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Rejection of [`CurrentUser`].
#[derive(Debug)]
pub enum AuthRejection {
    /// No live session; send the browser to the log-in page.
    LoginRequired(String),
    /// Session lookup failed.
    Internal(ApiError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired(next) => Redirect::to(&login_redirect(&next)).into_response(),
            AuthRejection::Internal(err) => err.into_response(),
        }
    }
}

/// Log-in URL that returns to `next` afterwards.
pub fn login_redirect(next: &str) -> String {
    format!("/log-in?next={}", urlencoding::encode(next))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/")
                    .to_string();
                Err(AuthRejection::LoginRequired(next))
            }
            Err(err) => Err(AuthRejection::Internal(err)),
        }
    }
}

/// Optional session extractor.
///
/// Similar to [`CurrentUser`] but yields `None` instead of redirecting.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        session_user(parts, state).await.map(MaybeUser)
    }
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(&state.cookie_name) else {
        return Ok(None);
    };

    match state.sessions().resolve(cookie.value()).await {
        Ok(user) => Ok(Some(user)),
        Err(SessionError::SessionNotFound) => {
            tracing::debug!("Session cookie did not match a live session");
            Ok(None)
        }
        Err(SessionError::Database(msg)) => {
            tracing::error!("Session lookup failed: {}", msg);
            Err(ApiError::internal("An internal error occurred"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_path_and_query() {
        assert_eq!(
            login_redirect("/homepage/folder/7?sortBy=name"),
            "/log-in?next=%2Fhomepage%2Ffolder%2F7%3FsortBy%3Dname"
        );
        assert_eq!(login_redirect("/homepage"), "/log-in?next=%2Fhomepage");
    }

    #[test]
    fn test_login_required_is_see_other() {
        let response = AuthRejection::LoginRequired("/homepage".to_string()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/log-in?next=%2Fhomepage"
        );
    }
}
