//! HTTP layer for filenest.
//!
//! Form posts answer with `303 See Other` redirects; pages are JSON
//! documents describing what the browser UI renders.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_router, ApiDoc};
pub use server::WebServer;
