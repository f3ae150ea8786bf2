//! Repository factory
//!
//! One `RepositoryFactory` is built at startup and shared by `Arc`. It hands
//! out the repository for an entity type through `for_entity::<E>()`.
//!
//! The factory never owns the pool's lifecycle: `close()` does nothing and
//! the application closes the pool on shutdown.

use super::{
    BlogRepository, BlogSubtypeRepository, PostRepository, SqlxBlogRepository,
    SqlxBlogSubtypeRepository, SqlxPostRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{Blog, BlogSubtype, Post};
use std::sync::Arc;

/// An entity type with a repository in the factory
pub trait Entity: Send + Sync + 'static {
    /// Repository interface for this entity
    type Repository: ?Sized + Send + Sync;

    fn repository(factory: &RepositoryFactory) -> Arc<Self::Repository>;
}

impl Entity for BlogSubtype {
    type Repository = dyn BlogSubtypeRepository;

    fn repository(factory: &RepositoryFactory) -> Arc<Self::Repository> {
        factory.blog_subtypes.clone()
    }
}

impl Entity for Blog {
    type Repository = dyn BlogRepository;

    fn repository(factory: &RepositoryFactory) -> Arc<Self::Repository> {
        factory.blogs.clone()
    }
}

impl Entity for Post {
    type Repository = dyn PostRepository;

    fn repository(factory: &RepositoryFactory) -> Arc<Self::Repository> {
        factory.posts.clone()
    }
}

/// Shared source of entity repositories
pub struct RepositoryFactory {
    pool: DynDatabasePool,
    blog_subtypes: Arc<dyn BlogSubtypeRepository>,
    blogs: Arc<dyn BlogRepository>,
    posts: Arc<dyn PostRepository>,
}

impl RepositoryFactory {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            blog_subtypes: SqlxBlogSubtypeRepository::boxed(pool.clone()),
            blogs: SqlxBlogRepository::boxed(pool.clone()),
            posts: SqlxPostRepository::boxed(pool.clone()),
            pool,
        }
    }

    /// Repository for entity type `E`
    pub fn for_entity<E: Entity>(&self) -> Arc<E::Repository> {
        E::repository(self)
    }

    pub fn pool(&self) -> &DynDatabasePool {
        &self.pool
    }

    /// Intentionally a no-op; the pool is closed by its owner.
    pub fn close(&self) {
        tracing::debug!("Repository factory close requested; pool left to its owner");
    }
}
