//! Post repository

use crate::db::DynDatabasePool;
use crate::models::Post;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Posts of one blog, oldest first
    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Post>>;

    async fn list(&self, limit: usize) -> Result<Vec<Post>>;

    async fn update(&self, post: &Post) -> Result<Post>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let result = sqlx::query(
            r#"
            INSERT INTO post (blog_id, title, content, time_created)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(post.blog_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.time_created)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create post")?;

        let mut created = post.clone();
        created.id = Some(result.last_insert_rowid());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, blog_id, title, content, time_created FROM post WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get post by ID")?;

        Ok(row.as_ref().map(row_to_post))
    }

    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Post>> {
        list_posts_for_blog(self.pool.sqlite(), blog_id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, blog_id, title, content, time_created FROM post ORDER BY id LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list posts")?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let id = post
            .id
            .ok_or_else(|| anyhow!("Cannot update a post without an id"))?;

        let result = sqlx::query(
            "UPDATE post SET blog_id = ?, title = ?, content = ?, time_created = ? WHERE id = ?",
        )
        .bind(post.blog_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.time_created)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update post")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Post {} not found", id));
        }
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }
}

/// Load the posts of one blog; shared with the blog repository for eager loading
pub(crate) async fn list_posts_for_blog(pool: &SqlitePool, blog_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(
        "SELECT id, blog_id, title, content, time_created FROM post WHERE blog_id = ? ORDER BY id",
    )
    .bind(blog_id)
    .fetch_all(pool)
    .await
    .context("Failed to list posts by blog")?;

    Ok(rows.iter().map(row_to_post).collect())
}

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        id: Some(row.get("id")),
        blog_id: row.get("blog_id"),
        title: row.get("title"),
        content: row.get("content"),
        time_created: row.get("time_created"),
    }
}
