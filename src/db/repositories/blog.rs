//! Blog repository
//!
//! Blogs are always returned with their subtype and their posts.

use super::blog_subtype::blog_type_from_column;
use super::post::list_posts_for_blog;
use crate::db::DynDatabasePool;
use crate::models::{Blog, BlogSubtype};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

const SELECT_BLOG: &str = r#"
    SELECT b.id, b.handle, b.description, b.type, b.subtype_id, b.enabled, b.image,
           b.time_created, s.name AS subtype_name, s.type AS subtype_type
    FROM blog b
    LEFT JOIN blog_subtype s ON s.id = b.subtype_id
"#;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// Blogs ordered by id, at most `limit`
    async fn list(&self, limit: usize) -> Result<Vec<Blog>>;

    async fn count(&self) -> Result<i64>;

    async fn update(&self, blog: &Blog) -> Result<Blog>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        let pool = self.pool.sqlite();
        let result = sqlx::query(
            r#"
            INSERT INTO blog (handle, description, type, subtype_id, enabled, image, time_created)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&blog.handle)
        .bind(&blog.description)
        .bind(blog.blog_type.ordinal())
        .bind(blog.subtype_id())
        .bind(blog.enabled)
        .bind(&blog.image)
        .bind(blog.time_created)
        .execute(pool)
        .await
        .context("Failed to create blog")?;

        let id = result.last_insert_rowid();
        get_blog(pool, id)
            .await?
            .ok_or_else(|| anyhow!("Blog {} vanished after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        get_blog(self.pool.sqlite(), id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<Blog>> {
        let pool = self.pool.sqlite();
        let sql = format!("{} ORDER BY b.id LIMIT ?", SELECT_BLOG);
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(pool)
            .await
            .context("Failed to list blogs")?;

        let mut blogs = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut blog = row_to_blog(row)?;
            if let Some(id) = blog.id {
                blog.post_list = list_posts_for_blog(pool, id).await?;
            }
            blogs.push(blog);
        }
        Ok(blogs)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blog")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count blogs")
    }

    async fn update(&self, blog: &Blog) -> Result<Blog> {
        let pool = self.pool.sqlite();
        let id = blog
            .id
            .ok_or_else(|| anyhow!("Cannot update a blog without an id"))?;

        let result = sqlx::query(
            r#"
            UPDATE blog
            SET handle = ?, description = ?, type = ?, subtype_id = ?, enabled = ?,
                image = ?, time_created = ?
            WHERE id = ?
            "#,
        )
        .bind(&blog.handle)
        .bind(&blog.description)
        .bind(blog.blog_type.ordinal())
        .bind(blog.subtype_id())
        .bind(blog.enabled)
        .bind(&blog.image)
        .bind(blog.time_created)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update blog")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Blog {} not found", id));
        }

        get_blog(pool, id)
            .await?
            .ok_or_else(|| anyhow!("Blog {} not found", id))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete blog")?;
        Ok(result.rows_affected() > 0)
    }
}

async fn get_blog(pool: &SqlitePool, id: i64) -> Result<Option<Blog>> {
    let sql = format!("{} WHERE b.id = ?", SELECT_BLOG);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;

    match row {
        Some(row) => {
            let mut blog = row_to_blog(&row)?;
            blog.post_list = list_posts_for_blog(pool, id).await?;
            Ok(Some(blog))
        }
        None => Ok(None),
    }
}

fn row_to_blog(row: &SqliteRow) -> Result<Blog> {
    let subtype_id: Option<i64> = row.get("subtype_id");
    let subtype = match subtype_id {
        Some(sid) => Some(BlogSubtype {
            id: Some(sid),
            name: row.get("subtype_name"),
            blog_type: blog_type_from_column(row.get("subtype_type"))?,
        }),
        None => None,
    };

    Ok(Blog {
        id: Some(row.get("id")),
        handle: row.get("handle"),
        description: row.get("description"),
        blog_type: blog_type_from_column(row.get("type"))?,
        subtype,
        enabled: row.get("enabled"),
        image: row.get("image"),
        time_created: row.get("time_created"),
        post_list: Vec::new(),
    })
}
