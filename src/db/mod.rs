//! Database layer
//!
//! SQLite persistence for the Webform service:
//! - connection pool (`pool`)
//! - embedded migrations (`migrations`)
//! - enum reference table synchronisation (`enums`)
//! - entity repositories and the repository factory (`repositories`)
//!
//! # Usage
//!
//! ```ignore
//! use webform::config::DatabaseConfig;
//! use webform::db::{self, create_pool};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! db::prepare(&pool).await?;
//! ```

pub mod enums;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use enums::sync_enum_tables;
pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};

/// Bring a freshly opened database to a usable state: apply pending
/// migrations, then synchronise enum reference rows.
pub async fn prepare(pool: &DynDatabasePool) -> anyhow::Result<()> {
    migrations::run_migrations(pool).await?;
    sync_enum_tables(pool).await?;
    Ok(())
}

/// In-memory database with the schema applied, for tests
#[cfg(test)]
pub async fn create_prepared_test_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    prepare(&pool).await.expect("Failed to prepare test database");
    pool
}
