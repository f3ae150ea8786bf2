//! Blog subtype repository
//!
//! This module provides:
//! - `BlogSubtypeRepository` trait defining the interface for subtype data access
//! - `SqlxBlogSubtypeRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::{BlogSubtype, BlogType};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Blog subtype repository trait
#[async_trait]
pub trait BlogSubtypeRepository: Send + Sync {
    /// Insert a new subtype
    async fn create(&self, subtype: &BlogSubtype) -> Result<BlogSubtype>;

    /// Insert unless a subtype with the same `(type, name)` exists.
    /// Returns the stored row only when a new one was written.
    async fn create_if_absent(&self, subtype: &BlogSubtype) -> Result<Option<BlogSubtype>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogSubtype>>;

    async fn find_by_type_and_name(
        &self,
        blog_type: BlogType,
        name: &str,
    ) -> Result<Option<BlogSubtype>>;

    /// Subtypes of one type ordered by id, at most `limit`
    async fn list_by_type(&self, blog_type: BlogType, limit: usize) -> Result<Vec<BlogSubtype>>;

    /// All subtypes ordered by id, at most `limit`
    async fn list(&self, limit: usize) -> Result<Vec<BlogSubtype>>;

    async fn count(&self) -> Result<i64>;

    async fn count_by_type(&self, blog_type: BlogType) -> Result<i64>;

    async fn update(&self, subtype: &BlogSubtype) -> Result<BlogSubtype>;

    /// Delete by id. Returns false when nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based blog subtype repository implementation
pub struct SqlxBlogSubtypeRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogSubtypeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogSubtypeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogSubtypeRepository for SqlxBlogSubtypeRepository {
    async fn create(&self, subtype: &BlogSubtype) -> Result<BlogSubtype> {
        create_subtype(self.pool.sqlite(), subtype).await
    }

    async fn create_if_absent(&self, subtype: &BlogSubtype) -> Result<Option<BlogSubtype>> {
        let pool = self.pool.sqlite();
        let result = sqlx::query(
            r#"
            INSERT INTO blog_subtype (name, type)
            VALUES (?, ?)
            ON CONFLICT(type, name) DO NOTHING
            "#,
        )
        .bind(&subtype.name)
        .bind(subtype.blog_type.ordinal())
        .execute(pool)
        .await
        .context("Failed to upsert blog subtype")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let mut created = subtype.clone();
        created.id = Some(result.last_insert_rowid());
        Ok(Some(created))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogSubtype>> {
        let row = sqlx::query("SELECT id, name, type FROM blog_subtype WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get blog subtype by ID")?;

        row.map(|r| row_to_subtype(&r)).transpose()
    }

    async fn find_by_type_and_name(
        &self,
        blog_type: BlogType,
        name: &str,
    ) -> Result<Option<BlogSubtype>> {
        let row = sqlx::query("SELECT id, name, type FROM blog_subtype WHERE type = ? AND name = ?")
            .bind(blog_type.ordinal())
            .bind(name)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to find blog subtype")?;

        row.map(|r| row_to_subtype(&r)).transpose()
    }

    async fn list_by_type(&self, blog_type: BlogType, limit: usize) -> Result<Vec<BlogSubtype>> {
        let rows = sqlx::query(
            "SELECT id, name, type FROM blog_subtype WHERE type = ? ORDER BY id LIMIT ?",
        )
        .bind(blog_type.ordinal())
        .bind(limit as i64)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list blog subtypes by type")?;

        rows.iter().map(row_to_subtype).collect()
    }

    async fn list(&self, limit: usize) -> Result<Vec<BlogSubtype>> {
        let rows = sqlx::query("SELECT id, name, type FROM blog_subtype ORDER BY id LIMIT ?")
            .bind(limit as i64)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list blog subtypes")?;

        rows.iter().map(row_to_subtype).collect()
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blog_subtype")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count blog subtypes")
    }

    async fn count_by_type(&self, blog_type: BlogType) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blog_subtype WHERE type = ?")
            .bind(blog_type.ordinal())
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count blog subtypes by type")
    }

    async fn update(&self, subtype: &BlogSubtype) -> Result<BlogSubtype> {
        let id = subtype
            .id
            .ok_or_else(|| anyhow!("Cannot update a blog subtype without an id"))?;

        let result = sqlx::query("UPDATE blog_subtype SET name = ?, type = ? WHERE id = ?")
            .bind(&subtype.name)
            .bind(subtype.blog_type.ordinal())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update blog subtype")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Blog subtype {} not found", id));
        }
        Ok(subtype.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_subtype WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete blog subtype")?;
        Ok(result.rows_affected() > 0)
    }
}

async fn create_subtype(pool: &SqlitePool, subtype: &BlogSubtype) -> Result<BlogSubtype> {
    let result = sqlx::query("INSERT INTO blog_subtype (name, type) VALUES (?, ?)")
        .bind(&subtype.name)
        .bind(subtype.blog_type.ordinal())
        .execute(pool)
        .await
        .context("Failed to create blog subtype")?;

    let mut created = subtype.clone();
    created.id = Some(result.last_insert_rowid());
    Ok(created)
}

/// Decode a stored type ordinal
pub(crate) fn blog_type_from_column(ordinal: i64) -> Result<BlogType> {
    BlogType::from_ordinal(ordinal).ok_or_else(|| anyhow!("Unknown blog type ordinal {}", ordinal))
}

fn row_to_subtype(row: &SqliteRow) -> Result<BlogSubtype> {
    Ok(BlogSubtype {
        id: Some(row.get("id")),
        name: row.get("name"),
        blog_type: blog_type_from_column(row.get("type"))?,
    })
}
