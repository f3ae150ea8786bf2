//! Form session store
//!
//! Keeps the configuration of every open form between protocol stages.
//! Sessions expire after the configured idle TTL.

use crate::cache::{CacheLayer, MemoryCache};
use crate::models::FormConfig;
use anyhow::Result;
use std::time::Duration;

const KEY_PREFIX: &str = "form:";

/// New form id: `form` followed by 11 hex characters
pub fn generate_fid() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("form{}", &hex[..11])
}

pub struct FormStore {
    cache: MemoryCache,
    ttl: Duration,
}

impl FormStore {
    pub fn new(ttl: Duration, max_sessions: u64) -> Self {
        Self {
            cache: MemoryCache::with_capacity(max_sessions),
            ttl,
        }
    }

    fn key(fid: &str) -> String {
        format!("{}{}", KEY_PREFIX, fid)
    }

    pub async fn get(&self, fid: &str) -> Result<Option<FormConfig>> {
        self.cache.get(&Self::key(fid)).await
    }

    /// Store or replace a session, restarting its TTL
    pub async fn put(&self, config: &FormConfig) -> Result<()> {
        self.cache.set(&Self::key(&config.fid), config, self.ttl).await
    }

    /// Remove a session and return it; concurrent callers cannot both get it
    pub async fn take(&self, fid: &str) -> Result<Option<FormConfig>> {
        self.cache.take(&Self::key(fid)).await
    }
}
