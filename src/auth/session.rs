//! Cookie session management for filenest.
//!
//! The cookie carries a random UUIDv4 token. Only a peppered SHA-256 hash of
//! it is stored.

use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{DbPool, NewSession, SessionRepository, User, UserRepository};

/// Default session duration (7 days).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Session-related errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No live session for this token.
    #[error("session not found")]
    SessionNotFound,

    /// Storage failure.
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::FilenestError> for SessionError {
    fn from(e: crate::FilenestError) -> Self {
        SessionError::Database(e.to_string())
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Token to place in the cookie.
    pub token: String,
    /// Owning user.
    pub user_id: i64,
    /// Expiry as unix seconds.
    pub expires_at: i64,
}

/// Issues, resolves and revokes database-backed sessions.
pub struct SessionManager<'a> {
    pool: &'a DbPool,
    secret: &'a str,
    ttl: Duration,
}

impl<'a> SessionManager<'a> {
    /// Create a manager. `secret` peppers the stored token hashes.
    pub fn new(pool: &'a DbPool, secret: &'a str) -> Self {
        Self {
            pool,
            secret,
            ttl: Duration::from_secs(DEFAULT_SESSION_DURATION_SECS),
        }
    }

    /// Set the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Hash a cookie token for storage.
    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Start a session for a user.
    pub async fn create(&self, user_id: i64) -> Result<IssuedSession, SessionError> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now().timestamp() + self.ttl.as_secs() as i64;

        SessionRepository::new(self.pool)
            .create(&NewSession {
                token_hash: self.hash_token(&token),
                user_id,
                expires_at,
            })
            .await?;

        debug!(user_id, expires_at, "Session created");
        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    /// Resolve a cookie token to its user.
    pub async fn resolve(&self, token: &str) -> Result<User, SessionError> {
        let now = Utc::now().timestamp();
        let session = SessionRepository::new(self.pool)
            .get_valid(&self.hash_token(token), now)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        UserRepository::new(self.pool)
            .get_by_id(session.user_id)
            .await?
            .ok_or(SessionError::SessionNotFound)
    }

    /// End a session. Returns true if it existed.
    pub async fn destroy(&self, token: &str) -> Result<bool, SessionError> {
        let removed = SessionRepository::new(self.pool)
            .delete(&self.hash_token(token))
            .await?;
        if removed {
            debug!("Session destroyed");
        }
        Ok(removed)
    }

    /// Remove expired sessions. Returns how many were purged.
    pub async fn cleanup_expired(&self) -> Result<u64, SessionError> {
        let purged = SessionRepository::new(self.pool)
            .cleanup_expired(Utc::now().timestamp())
            .await?;
        if purged > 0 {
            info!(count = purged, "Cleaned up expired sessions");
        }
        Ok(purged)
    }
}
