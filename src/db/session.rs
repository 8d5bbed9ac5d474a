//! Session repository backing cookie logins.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{FilenestError, Result};

/// A persisted login session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    /// Session ID.
    pub id: i64,
    /// SHA-256 hex of the cookie token.
    pub token_hash: String,
    /// Owning user ID.
    pub user_id: i64,
    /// Expiry as unix seconds.
    pub expires_at: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now` (unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// New session for creation.
pub struct NewSession {
    /// SHA-256 hex of the cookie token.
    pub token_hash: String,
    /// Owning user ID.
    pub user_id: i64,
    /// Expiry as unix seconds.
    pub expires_at: i64,
}

/// Repository for session operations.
pub struct SessionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new session.
    pub async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, token_hash, user_id, expires_at, created_at",
        )
        .bind(&new_session.token_hash)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(session)
    }

    /// Get a session that has not expired at `now`.
    pub async fn get_valid(&self, token_hash: &str, now: i64) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, token_hash, user_id, expires_at, created_at
             FROM sessions WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(session)
    }

    /// Delete a session by token hash.
    pub async fn delete(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await
            .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every session of a user.
    pub async fn delete_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete sessions that expired at or before `now`.
    pub async fn cleanup_expired(&self, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await
            .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
