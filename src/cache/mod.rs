//! Cache layer
//!
//! In-memory, TTL-bound key/value storage. Form sessions live here between
//! protocol stages.
//!
//! # Usage
//!
//! ```rust,ignore
//! use webform::cache::{CacheLayer, MemoryCache};
//!
//! let cache = MemoryCache::with_capacity(1_000);
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Cache layer trait
///
/// The generic methods make this trait unusable as `dyn CacheLayer`;
/// callers hold a concrete cache type.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove a value and return it. Of concurrent callers taking the
    /// same key, at most one receives the value.
    async fn take<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;
}

pub use memory::MemoryCache;
