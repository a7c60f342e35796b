//! Page contexts and admin rows.
//!
//! Every type here is made of strings, integers, timestamps and nested lists
//! of the same, so templates never reach back into the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tag as shown in lists and sidebars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub title: String,
    pub posts_with_tag: u64,
}

/// A post as shown in feeds, tag listings and sidebars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: u64,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub slug: String,
    pub tags: Vec<TagSummary>,
    pub first_tag_title: Option<String>,
    pub likes_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEntry {
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
}

/// Full post shown on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments: Vec<CommentEntry>,
    pub likes_amount: u64,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub slug: String,
    pub tags: Vec<TagSummary>,
}

/// Data shared by every public page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidebar {
    pub most_popular_posts: Vec<PostSummary>,
    pub popular_tags: Vec<TagSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePage {
    #[serde(flatten)]
    pub sidebar: Sidebar,
    pub page_posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    #[serde(flatten)]
    pub sidebar: Sidebar,
    pub post: PostDetail,
    pub similar_posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagPage {
    #[serde(flatten)]
    pub sidebar: Sidebar,
    pub tag: String,
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPage {
    #[serde(flatten)]
    pub sidebar: Sidebar,
}

/// One page of an admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPostRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub likes_count: u64,
    pub comments_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPostDetail {
    #[serde(flatten)]
    pub row: AdminPostRow,
    pub slug: String,
    pub text: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminTagRow {
    pub id: Uuid,
    pub title: String,
    pub posts_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCommentRow {
    pub id: Uuid,
    pub author: String,
    pub post_id: Uuid,
    pub post_title: String,
    pub text_preview: String,
    pub published_at: DateTime<Utc>,
}
