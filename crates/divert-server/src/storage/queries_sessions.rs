//! Session and flash message queries.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{FlashMessage, Session};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl Database {
    // =========================================================================
    // Session queries
    // =========================================================================

    /// Store a new session by token hash.
    pub async fn create_session(
        &self,
        id: &str,
        account_id: i64,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Session, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO sessions (id, account_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(account_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Session {id}")))
    }

    /// Find a live (non-revoked, non-expired) session by ID and token hash.
    pub async fn get_active_session(
        &self,
        id: &str,
        token_hash: &str,
    ) -> Result<Option<Session>, DatabaseError> {
        let now = unix_timestamp();

        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE id = ? AND token_hash = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(id)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(session)
    }

    /// Revoke a session by ID.
    pub async fn revoke_session(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE sessions SET revoked = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove revoked and expired sessions. Their queued flash messages go
    /// with them.
    pub async fn delete_expired_sessions(&self) -> Result<u64, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query("DELETE FROM sessions WHERE revoked = 1 OR expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Flash message queries
    // =========================================================================

    /// Queue a message for the next page the session renders.
    pub async fn push_flash(
        &self,
        session_id: &str,
        level: FlashLevel,
        message: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO flash_messages (session_id, level, message, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(level.as_str())
        .bind(message)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Drain queued messages in insertion order.
    pub async fn take_flashes(&self, session_id: &str) -> Result<Vec<FlashMessage>, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let messages = sqlx::query_as::<_, FlashMessage>(
            "SELECT * FROM flash_messages WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(last) = messages.last() {
            sqlx::query("DELETE FROM flash_messages WHERE session_id = ? AND id <= ?")
                .bind(session_id)
                .bind(last.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(messages)
    }
}
