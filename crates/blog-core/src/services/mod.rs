//! Read services composing the repositories into page data.

mod admin;
mod feed;
mod serialize;

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::ports::{CommentRepository, PostRepository, TagRepository, UserRepository};

pub use admin::AdminService;
pub use feed::BlogService;
pub use serialize::{image_url, teaser, text_preview};

/// The repositories a service reads from.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// Limits and presentation settings for the public pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub popular_limit: u64,
    pub recent_limit: u64,
    pub similar_limit: u64,
    pub tag_posts_limit: u64,
    pub teaser_chars: usize,
    /// Prefix joined with a post's image path to build its URL.
    pub media_url: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            popular_limit: 5,
            recent_limit: 5,
            similar_limit: 5,
            tag_posts_limit: 20,
            teaser_chars: 200,
            media_url: "/media/".to_string(),
        }
    }
}

/// Deduplicate ids, keeping first-seen order.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
