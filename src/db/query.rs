//! Generic soft-delete-aware query layer.
//!
//! Every entity table (users, exercises, solutions, announcements) shares
//! the same lifecycle: rows are created live, mutated in place, "deleted"
//! by flipping `is_deleted`, and never surfaced again by normal queries.
//! This module implements listing, point lookup, and soft delete once,
//! parameterized by entity type; inserts and partial updates stay in the
//! per-entity repositories because their column sets differ.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::FromRow;

use super::user::Role;
use crate::{Error, Result};

/// An entity stored in a soft-delete table.
pub trait SoftDeleteEntity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table name.
    const TABLE: &'static str;
    /// Singular name used in NotFound errors.
    const NAME: &'static str;
    /// Columns the keyword filter searches (case-insensitive substring).
    const SEARCH_COLUMNS: &'static [&'static str];
    /// Whether the table has a `role` column the filter may target.
    const HAS_ROLE: bool = false;
}

/// Listing filter and pagination options.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Keyword matched as a case-insensitive substring of the entity's
    /// search columns. Trimmed and lower-cased before matching.
    pub keyword: Option<String>,
    /// Role filter (users only; ignored for tables without a role column).
    pub role: Option<Role>,
    /// Page number, starting at 1.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            keyword: None,
            role: None,
            page: 1,
            page_size: 10,
        }
    }
}

impl ListOptions {
    /// Create options with the defaults (page 1, 10 items).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keyword filter.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Set the role filter.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the page number (1-based).
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Count after filtering, before pagination.
    pub total: i64,
    /// At most `page_size` items.
    pub items: Vec<T>,
}

/// List live records matching the filter, with pagination.
///
/// `total` reflects the filtered count, not the page size. Results are
/// ordered by id for stable pagination.
pub async fn list<T: SoftDeleteEntity>(pool: &SqlitePool, opts: &ListOptions) -> Result<Page<T>> {
    let keyword = opts
        .keyword
        .as_deref()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty());

    let mut where_clause = String::from("is_deleted = 0");
    if keyword.is_some() {
        // instr() gives plain substring semantics; LIKE would need
        // escaping of % and _ in the keyword.
        let matches: Vec<String> = T::SEARCH_COLUMNS
            .iter()
            .map(|col| format!("instr(lower(coalesce({col}, '')), ?) > 0"))
            .collect();
        where_clause.push_str(" AND (");
        where_clause.push_str(&matches.join(" OR "));
        where_clause.push(')');
    }
    let role = if T::HAS_ROLE { opts.role } else { None };
    if role.is_some() {
        where_clause.push_str(" AND role = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM {} WHERE {}", T::TABLE, where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(ref kw) = keyword {
        for _ in T::SEARCH_COLUMNS {
            count_query = count_query.bind(kw.clone());
        }
    }
    if let Some(role) = role {
        count_query = count_query.bind(role.as_str());
    }
    let total = count_query.fetch_one(pool).await?;

    let page = opts.page.max(1);
    let offset = (page as i64 - 1) * opts.page_size as i64;
    let select_sql = format!(
        "SELECT * FROM {} WHERE {} ORDER BY id LIMIT ? OFFSET ?",
        T::TABLE,
        where_clause
    );
    let mut query = sqlx::query_as::<_, T>(&select_sql);
    if let Some(ref kw) = keyword {
        for _ in T::SEARCH_COLUMNS {
            query = query.bind(kw.clone());
        }
    }
    if let Some(role) = role {
        query = query.bind(role.as_str());
    }
    let items = query
        .bind(opts.page_size as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(Page { total, items })
}

/// Get a live record by id.
pub async fn get<T: SoftDeleteEntity>(pool: &SqlitePool, id: i64) -> Result<Option<T>> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = ? AND is_deleted = 0",
        T::TABLE
    );
    Ok(sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Soft-delete a live record by id.
///
/// Fails with `NotFound` if no live record matches; deleting an
/// already-deleted record is therefore rejected, not silently repeated.
pub async fn soft_delete<T: SoftDeleteEntity>(pool: &SqlitePool, id: i64) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
        T::TABLE
    );
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(T::NAME.to_string()));
    }
    Ok(())
}
