//! Persisted login failure history.
//!
//! The lockout tracker keeps its sliding window here rather than in
//! memory so the limit survives a process restart. This table is keyed
//! by username rather than user id: failures against unknown usernames
//! are never recorded, but a user deleted mid-window keeps their
//! history under the (now reusable) name.

use sqlx::sqlite::SqlitePool;

use crate::Result;

/// One failed login attempt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginFailureRecord {
    pub id: i64,
    pub username: String,
    /// When the attempt failed (ms since epoch).
    pub failed_at: i64,
}

/// Repository for the login failure history.
pub struct LoginFailureRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LoginFailureRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a failed attempt for the username.
    pub async fn append(&self, username: &str, failed_at: i64) -> Result<()> {
        sqlx::query("INSERT INTO login_failures (username, failed_at) VALUES (?, ?)")
            .bind(username)
            .bind(failed_at)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Keep only the `keep` most recent failures for the username.
    pub async fn prune(&self, username: &str, keep: u32) -> Result<()> {
        sqlx::query(
            "DELETE FROM login_failures
             WHERE username = ?
               AND id NOT IN (
                   SELECT id FROM login_failures
                   WHERE username = ?
                   ORDER BY failed_at DESC, id DESC
                   LIMIT ?
               )",
        )
        .bind(username)
        .bind(username)
        .bind(keep as i64)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Fetch up to `limit` most recent failures, newest first.
    pub async fn recent(&self, username: &str, limit: u32) -> Result<Vec<LoginFailureRecord>> {
        Ok(sqlx::query_as::<_, LoginFailureRecord>(
            "SELECT id, username, failed_at FROM login_failures
             WHERE username = ?
             ORDER BY failed_at DESC, id DESC
             LIMIT ?",
        )
        .bind(username)
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?)
    }

    /// Delete all failure records for the username.
    pub async fn clear(&self, username: &str) -> Result<()> {
        sqlx::query("DELETE FROM login_failures WHERE username = ?")
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
