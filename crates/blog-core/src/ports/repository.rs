use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag, User};
use crate::error::RepoError;
use crate::ports::query::{CommentFilter, Page, PageRequest, PostFilter};
use crate::read_model::CountMap;

/// Generic repository trait defining standard persistence operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Usernames for a batch of user ids. Unknown ids are absent.
    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError>;
}

/// Post repository.
///
/// Count methods return an entry for every supplied id (zero when there are
/// no rows) and never query for an empty batch.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Most recently published post with this slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Posts for a batch of ids, in no particular order.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>, RepoError>;

    /// Newest posts first.
    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Newest posts carrying the tag.
    async fn with_tag(&self, tag_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Top `limit` post ids by likes count, descending.
    async fn most_liked(&self, limit: u64) -> Result<Vec<(Uuid, u64)>, RepoError>;

    async fn likes_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError>;

    async fn comments_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError>;

    /// Ids of posts sharing at least one tag with `post_id`, most shared tags
    /// first, then newest first. Never contains `post_id`.
    async fn similar(&self, post_id: Uuid, limit: u64) -> Result<Vec<Uuid>, RepoError>;

    async fn search(&self, filter: &PostFilter, page: PageRequest)
    -> Result<Page<Post>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    /// Exact lookup; callers pass a normalized title.
    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError>;

    /// Top `limit` tags by number of posts, descending.
    async fn most_used(&self, limit: u64) -> Result<Vec<(Tag, u64)>, RepoError>;

    /// `(post_id, tag)` pairs for a batch of posts, ordered by tag title.
    async fn for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>, RepoError>;

    async fn post_counts(&self, tag_ids: &[Uuid]) -> Result<CountMap, RepoError>;

    async fn search(&self, query: Option<&str>, page: PageRequest)
    -> Result<Page<Tag>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    async fn search(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError>;
}
