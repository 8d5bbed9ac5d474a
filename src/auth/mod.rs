//! Authentication module for filenest.
//!
//! This module provides password hashing, sign-up validation, user
//! registration, credential checks and cookie session management.

mod login;
mod password;
mod registration;
mod session;
pub mod validation;

pub use login::{authenticate, LoginError};
pub use password::{hash_password, verify_password, PasswordError};
pub use registration::{register, RegistrationError, RegistrationRequest, USERNAME_TAKEN_MESSAGE};
pub use session::{IssuedSession, SessionError, SessionManager, DEFAULT_SESSION_DURATION_SECS};
pub use validation::{FieldErrors, ValidationError};
