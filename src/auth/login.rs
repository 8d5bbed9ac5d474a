//! Credential checks for the login form.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::db::{User, UserRepository};

/// Login failures.
#[derive(Error, Debug)]
pub enum LoginError {
    /// No account with that username.
    #[error("Incorrect username")]
    UnknownUser,

    /// The password did not match.
    #[error("Incorrect password")]
    WrongPassword,

    /// Lookup failed.
    #[error("database error: {0}")]
    Database(String),
}

/// Check a username and password pair.
///
/// The username is compared exactly, after trimming.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    username: &str,
    password: &str,
) -> Result<User, LoginError> {
    let username = username.trim();

    let user = repo
        .get_by_username(username)
        .await
        .map_err(|e| LoginError::Database(e.to_string()))?
        .ok_or_else(|| {
            warn!(username = %username, "Login failed: user not found");
            LoginError::UnknownUser
        })?;

    if verify_password(password, &user.password).is_err() {
        warn!(username = %username, "Login failed: wrong password");
        return Err(LoginError::WrongPassword);
    }

    info!(user_id = user.id, username = %username, "Login successful");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{register, RegistrationRequest};
    use crate::Database;

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        register(
            &UserRepository::new(db.pool()),
            RegistrationRequest::new("alice", "Secret#123", "Secret#123"),
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let user = authenticate(&repo, "alice", "Secret#123").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let err = authenticate(&repo, "bob", "Secret#123").await.unwrap_err();
        assert!(matches!(err, LoginError::UnknownUser));
        assert_eq!(err.to_string(), "Incorrect username");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let err = authenticate(&repo, "alice", "Wrong#123").await.unwrap_err();
        assert!(matches!(err, LoginError::WrongPassword));
        assert_eq!(err.to_string(), "Incorrect password");
    }
}
