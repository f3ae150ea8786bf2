//! Blog subtype model

use crate::models::BlogType;
use serde::{Deserialize, Serialize};

/// A named refinement of a `BlogType`.
///
/// Identity is the database id: two subtypes are equal only when both ids
/// are assigned and match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSubtype {
    /// Unique identifier, `None` until persisted
    pub id: Option<i64>,
    /// Subtype name (at most 128 characters)
    pub name: String,
    /// Owning blog type
    #[serde(rename = "type")]
    pub blog_type: BlogType,
}

impl BlogSubtype {
    pub const NAME_MAX_LEN: usize = 128;

    pub fn new(name: impl Into<String>, blog_type: BlogType) -> Self {
        Self {
            id: None,
            name: name.into(),
            blog_type,
        }
    }
}

impl PartialEq for BlogSubtype {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}
