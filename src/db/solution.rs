//! Submitted solution records.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use super::query::{self, ListOptions, Page, SoftDeleteEntity};
use super::Database;
use crate::{Error, Result};

/// Review status of a submitted solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum SolutionStatus {
    /// Not yet reviewed.
    #[default]
    Pending,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompileError,
}

impl SolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionStatus::Pending => "pending",
            SolutionStatus::Accepted => "accepted",
            SolutionStatus::WrongAnswer => "wrong-answer",
            SolutionStatus::TimeLimitExceeded => "time-limit-exceeded",
            SolutionStatus::MemoryLimitExceeded => "memory-limit-exceeded",
            SolutionStatus::RuntimeError => "runtime-error",
            SolutionStatus::CompileError => "compile-error",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored solution.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SolutionRecord {
    pub id: i64,
    pub exercise_id: i64,
    pub creator_id: i64,
    pub content: String,
    pub language: String,
    /// Screenshot URLs, stored as a JSON array column.
    #[sqlx(json)]
    pub image_urls: Vec<String>,
    pub status: SolutionStatus,
    pub is_deleted: bool,
    pub created_at: i64,
}

impl SoftDeleteEntity for SolutionRecord {
    const TABLE: &'static str = "solutions";
    const NAME: &'static str = "solution";
    const SEARCH_COLUMNS: &'static [&'static str] = &["content"];
}

/// Data for submitting a new solution.
#[derive(Debug, Clone)]
pub struct NewSolution {
    pub exercise_id: i64,
    pub creator_id: i64,
    pub content: String,
    pub language: String,
    pub image_urls: Vec<String>,
}

impl NewSolution {
    pub fn new(
        exercise_id: i64,
        creator_id: i64,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            exercise_id,
            creator_id,
            content: content.into(),
            language: language.into(),
            image_urls: Vec::new(),
        }
    }

    pub fn with_image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = urls;
        self
    }
}

/// Partial update to a solution. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SolutionUpdate {
    pub content: Option<String>,
    pub language: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub status: Option<SolutionStatus>,
}

impl SolutionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = Some(urls);
        self
    }

    pub fn status(mut self, status: SolutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.language.is_none()
            && self.image_urls.is_none()
            && self.status.is_none()
    }
}

/// Repository for solution CRUD operations.
pub struct SolutionRepository<'a> {
    db: &'a Database,
}

impl<'a> SolutionRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Submit a new solution. Status starts at `pending`.
    pub async fn create(&self, new: &NewSolution) -> Result<SolutionRecord> {
        let now = Utc::now().timestamp_millis();
        let image_urls = serde_json::to_string(&new.image_urls)
            .map_err(|e| Error::Database(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO solutions (exercise_id, creator_id, content, language,
                                    image_urls, status, is_deleted, created_at)
             VALUES (?, ?, ?, ?, ?, 'pending', 0, ?)",
        )
        .bind(new.exercise_id)
        .bind(new.creator_id)
        .bind(&new.content)
        .bind(&new.language)
        .bind(image_urls)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| Error::NotFound("solution".to_string()))
    }

    /// Get a live solution by id.
    pub async fn get(&self, id: i64) -> Result<Option<SolutionRecord>> {
        query::get::<SolutionRecord>(self.db.pool(), id).await
    }

    /// Apply a partial update to a live solution.
    pub async fn update(&self, id: i64, update: &SolutionUpdate) -> Result<SolutionRecord> {
        if update.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound("solution".to_string()));
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE solutions SET ");
        let mut separated = query.separated(", ");

        if let Some(ref content) = update.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content.clone());
        }
        if let Some(ref language) = update.language {
            separated.push("language = ");
            separated.push_bind_unseparated(language.clone());
        }
        if let Some(ref urls) = update.image_urls {
            let json =
                serde_json::to_string(urls).map_err(|e| Error::Database(e.to_string()))?;
            separated.push("image_urls = ");
            separated.push_bind_unseparated(json);
        }
        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND is_deleted = 0");

        let result = query.build().execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("solution".to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound("solution".to_string()))
    }

    /// Set the review status of a live solution.
    pub async fn set_status(&self, id: i64, status: SolutionStatus) -> Result<SolutionRecord> {
        self.update(id, &SolutionUpdate::new().status(status)).await
    }

    /// Soft-delete a live solution.
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        query::soft_delete::<SolutionRecord>(self.db.pool(), id).await
    }

    /// List live solutions with filtering and pagination.
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<SolutionRecord>> {
        query::list::<SolutionRecord>(self.db.pool(), opts).await
    }

    /// List live solutions for one exercise, newest first.
    pub async fn list_for_exercise(&self, exercise_id: i64) -> Result<Vec<SolutionRecord>> {
        Ok(sqlx::query_as::<_, SolutionRecord>(
            "SELECT * FROM solutions
             WHERE exercise_id = ? AND is_deleted = 0
             ORDER BY created_at DESC, id DESC",
        )
        .bind(exercise_id)
        .fetch_all(self.db.pool())
        .await?)
    }
}
