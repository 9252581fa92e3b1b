//! User repository for studyhall.
//!
//! The credential store: exclusive owner of user-record lifecycle.
//! Password material, the version counter, and the disabled/deleted flags
//! are only ever written through the dedicated methods here, driven by the
//! session authenticator.

use chrono::Utc;
use sqlx::QueryBuilder;
use tracing::info;

use super::query::{self, ListOptions, Page};
use super::user::{NewUser, Role, UserRecord, UserUpdate};
use super::Database;
use crate::{Error, Result};

const USER_COLUMNS: &str = "id, username, password_salt, password_hash, role, version, \
                            is_disabled, is_deleted, created_at, nickname, avatar_url, bio";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository backed by the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new user.
    ///
    /// When `new_user.role` is `None`, the bootstrap policy applies: the
    /// user becomes a teacher if no live users exist at creation time, a
    /// student otherwise. The live-count read and the insert run in one
    /// transaction under the store write lock so concurrent registrations
    /// cannot both observe an empty table.
    ///
    /// Fails with `DuplicateUsername` if a live record with the same
    /// username exists.
    pub async fn create(&self, new_user: &NewUser) -> Result<UserRecord> {
        let _guard = self.db.write_guard().await;
        let mut tx = self.db.pool().begin().await?;

        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ? AND is_deleted = 0",
        )
        .bind(&new_user.username)
        .fetch_one(&mut *tx)
        .await?;
        if taken > 0 {
            return Err(Error::DuplicateUsername);
        }

        let role = match new_user.role {
            Some(role) => role,
            None => {
                let live: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0")
                        .fetch_one(&mut *tx)
                        .await?;
                if live == 0 {
                    Role::Teacher
                } else {
                    Role::Student
                }
            }
        };

        let created_at = Utc::now().timestamp_millis();
        let result = sqlx::query(
            "INSERT INTO users (username, password_salt, password_hash, role, version,
                                is_disabled, is_deleted, created_at, nickname)
             VALUES (?, ?, ?, ?, 0, 0, 0, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password_salt)
        .bind(&new_user.password_hash)
        .bind(role.as_str())
        .bind(created_at)
        .bind(&new_user.nickname)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        info!(username = %new_user.username, user_id = id, role = %role, "User created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    /// Get a live user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_deleted = 0");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    /// Get a user by ID, including soft-deleted records.
    ///
    /// Only the administrative password-reset path uses this.
    pub async fn get_by_id_any(&self, id: i64) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    /// Get a live user by exact username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? AND is_deleted = 0");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?)
    }

    /// Update profile fields (and, administratively, the role).
    ///
    /// Only fields set in the update are modified. Fails with `NotFound`
    /// if no live record matches.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<UserRecord> {
        if update.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| Error::NotFound("user".to_string()));
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref nickname) = update.nickname {
            separated.push("nickname = ");
            separated.push_bind_unseparated(nickname.clone());
        }
        if let Some(ref avatar_url) = update.avatar_url {
            separated.push("avatar_url = ");
            separated.push_bind_unseparated(avatar_url.clone());
        }
        if let Some(ref bio) = update.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio.clone());
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND is_deleted = 0");

        let result = query.build().execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user".to_string()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    /// Replace a user's password material and bump the version counter.
    ///
    /// Returns the new version. The bump is a single atomic UPDATE, so
    /// every token issued against the previous version is invalid the
    /// instant this commits. No deletion filter: the administrative reset
    /// path may target soft-deleted users.
    pub async fn set_password(&self, id: i64, hash: &str, salt: &str) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET password_hash = ?, password_salt = ?, version = version + 1
             WHERE id = ? RETURNING version",
        )
        .bind(hash)
        .bind(salt)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        let version = version.ok_or_else(|| Error::NotFound("user".to_string()))?;
        info!(user_id = id, version, "Password material replaced");
        Ok(version)
    }

    /// Set or clear the administrative disabled flag.
    ///
    /// Fails with `NotFound` if no live record matches.
    pub async fn set_disabled(&self, id: i64, disabled: bool) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET is_disabled = ? WHERE id = ? AND is_deleted = 0")
                .bind(disabled)
                .bind(id)
                .execute(self.db.pool())
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user".to_string()));
        }
        info!(user_id = id, disabled, "User disabled flag changed");
        Ok(())
    }

    /// Soft-delete a live user.
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        query::soft_delete::<UserRecord>(self.db.pool(), id).await?;
        info!(user_id = id, "User soft-deleted");
        Ok(())
    }

    /// Count live users.
    pub async fn count_live(&self) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0")
                .fetch_one(self.db.pool())
                .await?,
        )
    }

    /// List live users with filtering and pagination.
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<UserRecord>> {
        query::list::<UserRecord>(self.db.pool(), opts).await
    }
}
