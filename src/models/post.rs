//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry belonging to exactly one blog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Option<i64>,
    /// Owning blog id
    #[serde(rename = "blog")]
    pub blog_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub time_created: DateTime<Utc>,
}

impl Post {
    pub const TITLE_MAX_LEN: usize = 128;
    pub const CONTENT_MAX_LEN: usize = 4096;

    pub fn new(blog_id: i64, title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            id: None,
            blog_id,
            title: title.into(),
            content,
            time_created: Utc::now(),
        }
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}
