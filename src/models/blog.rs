//! Blog model

use crate::models::{BlogSubtype, BlogType, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog entity
///
/// `post_list` is always loaded together with the blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    /// Unique identifier, `None` until persisted
    pub id: Option<i64>,
    /// Short handle (at most 64 characters, never blank)
    pub handle: String,
    /// Free text description (at most 512 characters)
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub blog_type: BlogType,
    pub subtype: Option<BlogSubtype>,
    pub enabled: bool,
    /// Image URL (at most 255 characters)
    pub image: Option<String>,
    pub time_created: DateTime<Utc>,
    #[serde(default)]
    pub post_list: Vec<Post>,
}

impl Blog {
    pub const HANDLE_MAX_LEN: usize = 64;
    pub const DESCRIPTION_MAX_LEN: usize = 512;
    pub const IMAGE_MAX_LEN: usize = 255;

    /// Create an unsaved, disabled blog
    pub fn new(handle: impl Into<String>, blog_type: BlogType) -> Self {
        Self {
            id: None,
            handle: handle.into(),
            description: None,
            blog_type,
            subtype: None,
            enabled: false,
            image: None,
            time_created: Utc::now(),
            post_list: Vec::new(),
        }
    }

    pub fn subtype_id(&self) -> Option<i64> {
        self.subtype.as_ref().and_then(|s| s.id)
    }
}

impl PartialEq for Blog {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_new_defaults() {
        let blog = Blog::new("rustacean", BlogType::Technology);
        assert!(blog.id.is_none());
        assert!(!blog.enabled);
        assert!(blog.subtype.is_none());
        assert!(blog.post_list.is_empty());
        assert_eq!(blog.subtype_id(), None);
    }

    #[test]
    fn test_blog_equality_by_id() {
        let mut a = Blog::new("a", BlogType::Personal);
        let mut b = Blog::new("b", BlogType::Business);
        assert_ne!(a, b);
        a.id = Some(1);
        assert_ne!(a, b);
        b.id = Some(1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blog_wire_names() {
        let mut blog = Blog::new("a", BlogType::Business);
        blog.post_list.push(Post::new(1, "first", None));
        let json = serde_json::to_value(&blog).unwrap();
        assert_eq!(json["type"], "BUSINESS");
        assert!(json.get("timeCreated").is_some());
        assert_eq!(json["postList"].as_array().map(Vec::len), Some(1));
    }
}
