//! Announcement records.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::query::{self, ListOptions, Page, SoftDeleteEntity};
use super::Database;
use crate::{Error, Result};

/// A stored announcement.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnnouncementRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub creator_id: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SoftDeleteEntity for AnnouncementRecord {
    const TABLE: &'static str = "announcements";
    const NAME: &'static str = "announcement";
    const SEARCH_COLUMNS: &'static [&'static str] = &["title"];
}

/// Data for creating a new announcement.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub creator_id: i64,
}

impl NewAnnouncement {
    pub fn new(title: impl Into<String>, content: impl Into<String>, creator_id: i64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            creator_id,
        }
    }
}

/// Partial update to an announcement.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl AnnouncementUpdate {
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

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Repository for announcement CRUD operations.
pub struct AnnouncementRepository<'a> {
    db: &'a Database,
}

impl<'a> AnnouncementRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new announcement, stamping created_at/updated_at.
    pub async fn create(&self, new: &NewAnnouncement) -> Result<AnnouncementRecord> {
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query(
            "INSERT INTO announcements (title, content, creator_id, is_deleted,
                                        created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.creator_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| Error::NotFound("announcement".to_string()))
    }

    /// Get a live announcement by id.
    pub async fn get(&self, id: i64) -> Result<Option<AnnouncementRecord>> {
        query::get::<AnnouncementRecord>(self.db.pool(), id).await
    }

    /// Apply a partial update to a live announcement. Stamps updated_at.
    pub async fn update(&self, id: i64, update: &AnnouncementUpdate) -> Result<AnnouncementRecord> {
        if update.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound("announcement".to_string()));
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE announcements SET ");
        let mut separated = query.separated(", ");

        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }
        if let Some(ref content) = update.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content.clone());
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now().timestamp_millis());

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND is_deleted = 0");

        let result = query.build().execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("announcement".to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound("announcement".to_string()))
    }

    /// Soft-delete a live announcement.
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        query::soft_delete::<AnnouncementRecord>(self.db.pool(), id).await
    }

    /// List live announcements with filtering and pagination.
    pub async fn list(&self, opts: &ListOptions) -> Result<Page<AnnouncementRecord>> {
        query::list::<AnnouncementRecord>(self.db.pool(), opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let teacher = UserRepository::new(&db)
            .create(&NewUser::new("teacher", "hash", "salt"))
            .await
            .unwrap();
        let id = teacher.id;
        (db, id)
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let (db, creator) = setup().await;
        let repo = AnnouncementRepository::new(&db);

        let ann = repo
            .create(&NewAnnouncement::new("Welcome", "First day of class", creator))
            .await
            .unwrap();
        assert_eq!(ann.title, "Welcome");

        let updated = repo
            .update(ann.id, &AnnouncementUpdate::new().content("Updated text"))
            .await
            .unwrap();
        assert_eq!(updated.content, "Updated text");
        assert_eq!(updated.title, "Welcome");

        repo.soft_delete(ann.id).await.unwrap();
        assert!(repo.get(ann.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let (db, _) = setup().await;
        let repo = AnnouncementRepository::new(&db);

        let result = repo.update(42, &AnnouncementUpdate::new().title("x")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_keyword() {
        let (db, creator) = setup().await;
        let repo = AnnouncementRepository::new(&db);

        repo.create(&NewAnnouncement::new("Exam schedule", "...", creator))
            .await
            .unwrap();
        repo.create(&NewAnnouncement::new("Holiday notice", "...", creator))
            .await
            .unwrap();

        let page = repo.list(&ListOptions::new().keyword("exam")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Exam schedule");
    }
}
