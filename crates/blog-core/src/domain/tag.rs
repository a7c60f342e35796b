use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity - a lowercase label attached to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
}

impl Tag {
    /// Longest title the schema accepts.
    pub const MAX_TITLE_CHARS: usize = 20;

    /// Create a new tag; the title is stored lowercase.
    pub fn new(title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: Self::normalize_title(title),
        }
    }

    /// Canonical form of a tag title, used for storage and lookups alike.
    pub fn normalize_title(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn title_fits(title: &str) -> bool {
        title.chars().count() <= Self::MAX_TITLE_CHARS
    }
}
