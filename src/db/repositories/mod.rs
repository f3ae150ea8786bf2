//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity;
//! `RepositoryFactory` looks them up by entity type.

pub mod blog;
pub mod blog_subtype;
pub mod factory;
pub mod post;

pub use blog::{BlogRepository, SqlxBlogRepository};
pub use blog_subtype::{BlogSubtypeRepository, SqlxBlogSubtypeRepository};
pub use factory::{Entity, RepositoryFactory};
pub use post::{PostRepository, SqlxPostRepository};
