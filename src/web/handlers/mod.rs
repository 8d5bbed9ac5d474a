//! HTTP handlers for the web layer.

pub mod auth;
pub mod file;
pub mod folder;
pub mod home;

pub use auth::*;
pub use file::*;
pub use folder::*;
pub use home::*;
