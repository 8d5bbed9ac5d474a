//! User registration for filenest.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_signup, FieldErrors};
use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::FilenestError;

/// Message shown when the username is taken.
pub const USERNAME_TAKEN_MESSAGE: &str = "Username already taken. Please choose another one.";

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// One or more fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Username already exists.
    #[error("username already exists")]
    UsernameExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl RegistrationError {
    /// Field errors suitable for the sign-up form.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            RegistrationError::Validation(errors) => Some(errors.clone()),
            RegistrationError::UsernameExists => Some(FieldErrors::from([(
                "username".to_string(),
                vec![USERNAME_TAKEN_MESSAGE.to_string()],
            )])),
            _ => None,
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (3-20 characters of letters, digits, underscore).
    pub username: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

/// Register a new user.
///
/// 1. Validates all fields
/// 2. Checks if the username already exists
/// 3. Hashes the password
/// 4. Creates the user in the database
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    validate_signup(
        &request.username,
        &request.password,
        &request.confirm_password,
    )
    .map_err(RegistrationError::Validation)?;

    let username = request.username.trim();

    if repo
        .username_exists(username)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::UsernameExists);
    }

    let password_hash = hash_password(&request.password)?;

    let user = repo
        .create(&NewUser::new(username, password_hash))
        .await
        .map_err(|e| match e {
            FilenestError::Conflict(_) => RegistrationError::UsernameExists,
            other => RegistrationError::Database(other.to_string()),
        })?;

    info!(user_id = user.id, username = %user.username, "New user registered");

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::Database;

    #[tokio::test]
    async fn test_register_success() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let user = register(
            &repo,
            RegistrationRequest::new(" ab3_CD ", "Secret#123", "Secret#123"),
        )
        .await
        .unwrap();

        assert_eq!(user.username, "ab3_CD");
        assert_ne!(user.password, "Secret#123");
        assert!(verify_password("Secret#123", &user.password).is_ok());
    }

    #[tokio::test]
    async fn test_register_invalid_username() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let result = register(
            &repo,
            RegistrationRequest::new("ab", "Secret#123", "Secret#123"),
        )
        .await;

        match result {
            Err(RegistrationError::Validation(errors)) => {
                assert!(errors.contains_key("username"));
                assert!(!errors.contains_key("password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        register(
            &repo,
            RegistrationRequest::new("alice", "Secret#123", "Secret#123"),
        )
        .await
        .unwrap();

        let err = register(
            &repo,
            RegistrationRequest::new("alice", "Other#4567", "Other#4567"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RegistrationError::UsernameExists));
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["username"], vec![USERNAME_TAKEN_MESSAGE]);
    }
}
