//! filenest - multi-user file and folder storage
//!
//! Users sign up, organize folders in a per-user tree and upload files whose
//! content lives in a pluggable blob store (local disk or Cloudinary).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, verify_password, LoginError, PasswordError,
    RegistrationError, RegistrationRequest, SessionError, SessionManager, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FilenestError, Result};
pub use file::{BlobStore, ContentLister, FileService, FolderService};
pub use web::WebServer;
