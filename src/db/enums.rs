//! Enum reference tables
//!
//! Enumerations are stored by ordinal, and schema creation knows nothing
//! about their values. Every enum persisted this way is listed in
//! `ENUM_TABLES` and its rows are upserted at startup so foreign keys from
//! entity tables resolve.

use anyhow::{Context, Result};

use super::DynDatabasePool;
use crate::models::BlogType;

/// A table holding `(ordinal, name)` rows for one enum
#[derive(Debug, Clone, Copy)]
pub struct EnumTable {
    pub table: &'static str,
    pub values: fn() -> Vec<(i64, &'static str)>,
}

fn blog_type_values() -> Vec<(i64, &'static str)> {
    BlogType::ALL.iter().map(|t| (t.ordinal(), t.name())).collect()
}

/// All registered enum reference tables
pub const ENUM_TABLES: &[EnumTable] = &[EnumTable {
    table: "blog_type",
    values: blog_type_values,
}];

/// Upsert every registered enum value. Returns the number of rows written.
pub async fn sync_enum_tables(pool: &DynDatabasePool) -> Result<usize> {
    let mut written = 0;
    for table in ENUM_TABLES {
        let sql = format!(
            "INSERT INTO {} (id, name) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            table.table
        );
        for (ordinal, name) in (table.values)() {
            sqlx::query(&sql)
                .bind(ordinal)
                .bind(name)
                .execute(pool.sqlite())
                .await
                .with_context(|| format!("Failed to sync {} value {}", table.table, name))?;
            written += 1;
        }
        tracing::debug!("Synchronised enum table {}", table.table);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use sqlx::Row;

    #[tokio::test]
    async fn test_sync_writes_all_values_in_ordinal_order() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let written = sync_enum_tables(&pool).await.unwrap();
        assert_eq!(written, BlogType::ALL.len());

        let rows = sqlx::query("SELECT id, name FROM blog_type ORDER BY id")
            .fetch_all(pool.sqlite())
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
        assert_eq!(names, vec!["PERSONAL", "BUSINESS", "TECHNOLOGY", "ENTERTAINMENT"]);
    }

    #[tokio::test]
    async fn test_sync_is_repeatable() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        sync_enum_tables(&pool).await.unwrap();
        sync_enum_tables(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_type")
            .fetch_one(pool.sqlite())
            .await
            .unwrap();
        assert_eq!(count, BlogType::ALL.len() as i64);
    }
}
