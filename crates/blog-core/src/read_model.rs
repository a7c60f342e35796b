//! View models produced by the aggregation step.
//!
//! These carry counts computed for one request. They are never persisted and
//! never written back onto the domain entities.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Post, Tag};

/// Id to row count, one entry per requested id.
pub type CountMap = HashMap<Uuid, u64>;

/// Build a [`CountMap`] covering exactly `ids`, with zero for ids absent
/// from the grouped `rows`.
pub fn count_map<I>(ids: &[Uuid], rows: I) -> CountMap
where
    I: IntoIterator<Item = (Uuid, u64)>,
{
    let mut counts: CountMap = ids.iter().map(|id| (*id, 0)).collect();
    for (id, count) in rows {
        if let Some(slot) = counts.get_mut(&id) {
            *slot = count;
        }
    }
    counts
}

/// A tag with its post count, when already known.
#[derive(Debug, Clone)]
pub struct AnnotatedTag {
    pub tag: Tag,
    pub posts_count: Option<u64>,
}

impl AnnotatedTag {
    pub fn new(tag: Tag, posts_count: Option<u64>) -> Self {
        Self { tag, posts_count }
    }
}

/// A post with everything a listing needs, gathered in batch.
#[derive(Debug, Clone)]
pub struct AnnotatedPost {
    pub post: Post,
    pub author: String,
    /// Tags in the order the batch tag query returned them.
    pub tags: Vec<AnnotatedTag>,
    pub likes_count: Option<u64>,
    pub comments_count: Option<u64>,
}

impl AnnotatedPost {
    pub fn first_tag_title(&self) -> Option<&str> {
        self.tags.first().map(|t| t.tag.title.as_str())
    }
}
