//! Middleware and request extractors for the web layer.

pub mod auth;
pub mod cors;
pub mod security;

pub use auth::{login_redirect, AuthRejection, CurrentUser, MaybeUser};
pub use cors::create_cors_layer;
pub use security::security_headers;
