//! Exercise records.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;

use super::query::{self, ListOptions, Page, SoftDeleteEntity};
use super::Database;
use crate::{Error, Result};

/// Kind of media attached to an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media attachment on an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseMedia {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
}

/// A stored exercise.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExerciseRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub creator_id: i64,
    /// Attached media, stored as a JSON array column.
    #[sqlx(json)]
    pub media: Vec<ExerciseMedia>,
    /// Students only see published exercises; visibility enforcement is
    /// the caller's concern, the flag is just stored here.
    pub published: bool,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SoftDeleteEntity for ExerciseRecord {
    const TABLE: &'static str = "exercises";
    const NAME: &'static str = "exercise";
    const SEARCH_COLUMNS: &'static [&'static str] = &["title"];
}

/// Data for creating a new exercise.
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub title: String,
    pub content: String,
    pub creator_id: i64,
    pub media: Vec<ExerciseMedia>,
    pub published: bool,
}

impl NewExercise {
    pub fn new(title: impl Into<String>, content: impl Into<String>, creator_id: i64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            creator_id,
            media: Vec::new(),
            published: false,
        }
    }

    pub fn with_media(mut self, media: Vec<ExerciseMedia>) -> Self {
        self.media = media;
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

/// Partial update to an exercise. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ExerciseUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media: Option<Vec<ExerciseMedia>>,
    pub published: Option<bool>,
}

impl ExerciseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn media(mut self, media: Vec<ExerciseMedia>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.media.is_none()
            && self.published.is_none()
    }
}

/// Repository for exercise CRUD operations.
pub struct ExerciseRepository<'a> {
    db: &'a Database,
}

impl<'a> ExerciseRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new exercise, stamping created_at/updated_at.
    pub async fn create(&self, new: &NewExercise) -> Result<ExerciseRecord> {
        let now = Utc::now().timestamp_millis();
        let media = serde_json::to_string(&new.media)
            .map_err(|e| Error::Database(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO exercises (title, content, creator_id, media, published,
                                    is_deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.creator_id)
        .bind(media)
        .bind(new.published)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| Error::NotFound("exercise".to_string()))
    }

    /// Get a live exercise by id.
    pub async fn get(&self, id: i64) -> Result<Option<ExerciseRecord>> {
        query::get::<ExerciseRecord>(self.db.pool(), id).await
    }

    /// Apply a partial update to a live exercise. Always stamps updated_at.
    pub async fn update(&self, id: i64, update: &ExerciseUpdate) -> Result<ExerciseRecord> {
        if update.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound("exercise".to_string()));
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE exercises SET ");
        let mut separated = query.separated(", ");

        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }
        if let Some(ref content) = update.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content.clone());
        }
        if let Some(ref media) = update.media {
            let json =
                serde_json::to_string(media).map_err(|e| Error::Database(e.to_string()))?;
            separated.push("media = ");
            separated.push_bind_unseparated(json);
        }
        if let Some(published) = update.published {
            separated.push("published = ");
            separated.push_bind_unseparated(published);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now().timestamp_millis());

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND is_deleted = 0");

        let result = query.build().execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("exercise".to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound("exercise".to_string()))
    }

    /// Soft-delete a live exercise.
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        query::soft_delete::<ExerciseRecord>(self.db.pool(), id).await
    }

    /// List live exercises with filtering and pagination.
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<ExerciseRecord>> {
        query::list::<ExerciseRecord>(self.db.pool(), opts).await
    }
}
