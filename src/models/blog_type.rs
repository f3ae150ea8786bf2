//! Blog type enumeration
//!
//! `BlogType` is a closed set of blog categories. It is persisted by ordinal,
//! so the declaration order below is part of the storage format.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category of a blog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlogType {
    Personal,
    Business,
    Technology,
    Entertainment,
}

impl BlogType {
    /// Every value in ordinal order
    pub const ALL: [BlogType; 4] = [
        BlogType::Personal,
        BlogType::Business,
        BlogType::Technology,
        BlogType::Entertainment,
    ];

    /// Stored integer representation
    pub fn ordinal(self) -> i64 {
        match self {
            BlogType::Personal => 0,
            BlogType::Business => 1,
            BlogType::Technology => 2,
            BlogType::Entertainment => 3,
        }
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Constant name, e.g. `PERSONAL`
    pub fn name(self) -> &'static str {
        match self {
            BlogType::Personal => "PERSONAL",
            BlogType::Business => "BUSINESS",
            BlogType::Technology => "TECHNOLOGY",
            BlogType::Entertainment => "ENTERTAINMENT",
        }
    }

    /// Parse from an ordinal (`"2"`) or a case-insensitive name (`"technology"`)
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(ordinal) = s.parse::<i64>() {
            return Self::from_ordinal(ordinal);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for BlogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for BlogType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BlogType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Ordinal(i64),
            Name(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Ordinal(o) => BlogType::from_ordinal(o),
            Raw::Name(n) => BlogType::from_str(&n),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("unknown blog type"))
    }
}
