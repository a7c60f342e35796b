//! In-memory blog store - used when no database is configured, and in tests.
//!
//! Applies the same invariants as the relational schema: cascading deletes,
//! unique lowercase tag titles, unique usernames and live foreign keys.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::Repositories;
use blog_core::domain::{Comment, Post, Tag, User};
use blog_core::error::RepoError;
use blog_core::ports::{
    BaseRepository, CommentFilter, CommentRepository, Page, PageRequest, PostFilter,
    PostRepository, TagRepository, UserRepository,
};
use blog_core::read_model::{CountMap, count_map};

#[derive(Default)]
struct StoreData {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    comments: HashMap<Uuid, Comment>,
    /// `(post_id, tag_id)`
    post_tags: BTreeSet<(Uuid, Uuid)>,
    /// `(post_id, user_id)`
    likes: BTreeSet<(Uuid, Uuid)>,
}

impl StoreData {
    fn likes_of(&self, post_id: Uuid) -> u64 {
        self.likes.iter().filter(|(p, _)| *p == post_id).count() as u64
    }

    fn tags_of(&self, post_id: Uuid) -> HashSet<Uuid> {
        self.post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .map(|(_, t)| *t)
            .collect()
    }

    fn username(&self, user_id: Uuid) -> &str {
        self.users
            .get(&user_id)
            .map(|u| u.username.as_str())
            .unwrap_or_default()
    }

    fn remove_post(&mut self, post_id: Uuid) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != post_id);
        self.post_tags.retain(|(p, _)| *p != post_id);
        self.likes.retain(|(p, _)| *p != post_id);
        true
    }

    /// Newest first, id as tie-break.
    fn newest_first(posts: &mut [Post]) {
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Thread-safe in-memory implementation of every blog repository.
pub struct InMemoryBlogStore {
    data: RwLock<StoreData>,
    count_queries: AtomicU64,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            count_queries: AtomicU64::new(0),
        }
    }

    /// Repositories backed by this store.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            posts: self.clone(),
            tags: self.clone(),
            comments: self.clone(),
            users: self.clone(),
        }
    }

    /// Number of batch count lookups served so far.
    pub fn count_queries(&self) -> u64 {
        self.count_queries.load(Ordering::Relaxed)
    }

    fn record_count_query(&self) {
        self.count_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Attach a tag to a post. Attaching twice is a no-op.
    pub async fn tag_post(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.write().await;
        if !data.posts.contains_key(&post_id) || !data.tags.contains_key(&tag_id) {
            return Err(RepoError::Constraint("post or tag does not exist".to_string()));
        }
        data.post_tags.insert((post_id, tag_id));
        Ok(())
    }

    /// Record that a user liked a post. Liking twice is a no-op.
    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.write().await;
        if !data.posts.contains_key(&post_id) || !data.users.contains_key(&user_id) {
            return Err(RepoError::Constraint("post or user does not exist".to_string()));
        }
        data.likes.insert((post_id, user_id));
        Ok(())
    }
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn normalized_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.per_page as usize)
        .collect();
    Page {
        items,
        total,
        request,
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut data = self.data.write().await;
        if data
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.write().await;
        if data.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<Uuid> = data
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            data.remove_post(post_id);
        }
        data.comments.retain(|_, c| c.author_id != id);
        data.likes.retain(|(_, u)| *u != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryBlogStore {
    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        let data = self.data.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.users.get(id).map(|u| (*id, u.username.clone())))
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.data.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut data = self.data.write().await;
        if !data.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        data.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.data.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let data = self.data.read().await;
        Ok(data
            .posts
            .values()
            .filter(|p| p.slug == slug)
            .max_by_key(|p| p.published_at)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>, RepoError> {
        let data = self.data.read().await;
        Ok(ids.iter().filter_map(|id| data.posts.get(id).cloned()).collect())
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let data = self.data.read().await;
        let mut posts: Vec<Post> = data.posts.values().cloned().collect();
        StoreData::newest_first(&mut posts);
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn with_tag(&self, tag_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let data = self.data.read().await;
        let mut posts: Vec<Post> = data
            .post_tags
            .iter()
            .filter(|(_, t)| *t == tag_id)
            .filter_map(|(p, _)| data.posts.get(p).cloned())
            .collect();
        StoreData::newest_first(&mut posts);
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn most_liked(&self, limit: u64) -> Result<Vec<(Uuid, u64)>, RepoError> {
        self.record_count_query();
        let data = self.data.read().await;
        let mut posts: Vec<Post> = data.posts.values().cloned().collect();
        StoreData::newest_first(&mut posts);

        let mut ranking: Vec<(Uuid, u64)> =
            posts.iter().map(|p| (p.id, data.likes_of(p.id))).collect();
        // Stable: equal counts keep the newest-first order.
        ranking.sort_by_key(|(_, likes)| Reverse(*likes));
        ranking.truncate(limit as usize);
        Ok(ranking)
    }

    async fn likes_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if ids.is_empty() {
            return Ok(CountMap::new());
        }
        self.record_count_query();

        let data = self.data.read().await;
        let rows = data.likes.iter().fold(HashMap::<Uuid, u64>::new(), |mut acc, (post_id, _)| {
            *acc.entry(*post_id).or_insert(0u64) += 1;
            acc
        });
        Ok(count_map(ids, rows))
    }

    async fn comments_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if ids.is_empty() {
            return Ok(CountMap::new());
        }
        self.record_count_query();

        let data = self.data.read().await;
        let rows = data.comments.values().fold(HashMap::<Uuid, u64>::new(), |mut acc, c| {
            *acc.entry(c.post_id).or_insert(0u64) += 1;
            acc
        });
        Ok(count_map(ids, rows))
    }

    async fn similar(&self, post_id: Uuid, limit: u64) -> Result<Vec<Uuid>, RepoError> {
        self.record_count_query();
        let data = self.data.read().await;
        let source = data.tags_of(post_id);
        if source.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<(usize, &Post)> = data
            .posts
            .values()
            .filter(|p| p.id != post_id)
            .map(|p| (data.tags_of(p.id).intersection(&source).count(), p))
            .filter(|(shared, _)| *shared > 0)
            .collect();
        candidates.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.published_at.cmp(&a.published_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(candidates
            .into_iter()
            .take(limit as usize)
            .map(|(_, p)| p.id)
            .collect())
    }

    async fn search(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let data = self.data.read().await;
        let query = normalized_query(filter.query.as_deref());

        let mut posts: Vec<Post> = data
            .posts
            .values()
            .filter(|p| {
                query.as_deref().is_none_or(|q| {
                    contains_ci(&p.title, q) || contains_ci(data.username(p.author_id), q)
                })
            })
            .filter(|p| {
                filter
                    .tag_id
                    .is_none_or(|tag_id| data.post_tags.contains(&(p.id, tag_id)))
            })
            .filter(|p| filter.published.contains(p.published_at))
            .cloned()
            .collect();
        StoreData::newest_first(&mut posts);

        Ok(paginate(posts, page))
    }
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        Ok(self.data.read().await.tags.get(&id).cloned())
    }

    async fn save(&self, tag: Tag) -> Result<Tag, RepoError> {
        let tag = Tag {
            title: Tag::normalize_title(&tag.title),
            ..tag
        };
        if !Tag::title_fits(&tag.title) {
            return Err(RepoError::Constraint(format!(
                "tag '{}' is longer than {} characters",
                tag.title,
                Tag::MAX_TITLE_CHARS
            )));
        }

        let mut data = self.data.write().await;
        if data
            .tags
            .values()
            .any(|t| t.id != tag.id && t.title == tag.title)
        {
            return Err(RepoError::Constraint(format!(
                "tag '{}' already exists",
                tag.title
            )));
        }
        data.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.write().await;
        if data.tags.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        data.post_tags.retain(|(_, t)| *t != id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryBlogStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError> {
        let data = self.data.read().await;
        Ok(data.tags.values().find(|t| t.title == title).cloned())
    }

    async fn most_used(&self, limit: u64) -> Result<Vec<(Tag, u64)>, RepoError> {
        self.record_count_query();
        let data = self.data.read().await;

        let mut ranking: Vec<(Tag, u64)> = data
            .tags
            .values()
            .map(|t| {
                let posts = data.post_tags.iter().filter(|(_, id)| *id == t.id).count();
                (t.clone(), posts as u64)
            })
            .collect();
        ranking.sort_by(|(ta, ca), (tb, cb)| cb.cmp(ca).then_with(|| ta.title.cmp(&tb.title)));
        ranking.truncate(limit as usize);
        Ok(ranking)
    }

    async fn for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>, RepoError> {
        let data = self.data.read().await;
        let wanted: HashSet<&Uuid> = post_ids.iter().collect();

        let mut links: Vec<(Uuid, Tag)> = data
            .post_tags
            .iter()
            .filter(|(p, _)| wanted.contains(p))
            .filter_map(|(p, t)| data.tags.get(t).map(|tag| (*p, tag.clone())))
            .collect();
        links.sort_by(|(_, a), (_, b)| a.title.cmp(&b.title));
        Ok(links)
    }

    async fn post_counts(&self, tag_ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if tag_ids.is_empty() {
            return Ok(CountMap::new());
        }
        self.record_count_query();

        let data = self.data.read().await;
        let rows = data.post_tags.iter().fold(HashMap::<Uuid, u64>::new(), |mut acc, (_, tag_id)| {
            *acc.entry(*tag_id).or_insert(0u64) += 1;
            acc
        });
        Ok(count_map(tag_ids, rows))
    }

    async fn search(&self, query: Option<&str>, page: PageRequest) -> Result<Page<Tag>, RepoError> {
        let data = self.data.read().await;
        let query = normalized_query(query);

        let mut tags: Vec<Tag> = data
            .tags
            .values()
            .filter(|t| query.as_deref().is_none_or(|q| contains_ci(&t.title, q)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(paginate(tags, page))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.data.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut data = self.data.write().await;
        if !data.posts.contains_key(&comment.post_id) || !data.users.contains_key(&comment.author_id)
        {
            return Err(RepoError::Constraint(
                "comment post or author does not exist".to_string(),
            ));
        }
        data.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.data.write().await.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let data = self.data.read().await;
        let mut comments: Vec<Comment> = data
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(comments)
    }

    async fn search(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let data = self.data.read().await;
        let query = normalized_query(filter.query.as_deref());

        let mut comments: Vec<Comment> = data
            .comments
            .values()
            .filter(|c| {
                query.as_deref().is_none_or(|q| {
                    contains_ci(data.username(c.author_id), q)
                        || contains_ci(&c.text, q)
                        || data
                            .posts
                            .get(&c.post_id)
                            .is_some_and(|p| contains_ci(&p.title, q))
                })
            })
            .filter(|c| filter.published.contains(c.published_at))
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(paginate(comments, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (Arc<InMemoryBlogStore>, User, Post) {
        let store = Arc::new(InMemoryBlogStore::new());
        let author = store.save(User::new("alice", true)).await.unwrap();
        let post = store
            .save(Post::new(author.id, "Hello", "Body", "hello"))
            .await
            .unwrap();
        (store, author, post)
    }

    #[tokio::test]
    async fn test_tag_titles_are_stored_lowercase() {
        let store = InMemoryBlogStore::new();
        let tag = store
            .save(Tag {
                id: Uuid::new_v4(),
                title: "Rust".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tag.title, "rust");

        let dup = store.save(Tag::new("RUST")).await;
        assert!(matches!(dup, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_overlong_tag_title_is_rejected() {
        let store = InMemoryBlogStore::new();
        let long = store.save(Tag::new("a-title-well-over-twenty")).await;
        assert!(matches!(long, Err(RepoError::Constraint(_))));

        assert!(store.save(Tag::new("exactly-twenty-chars")).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleting_a_post_cascades() {
        let (store, author, post) = seeded().await;
        let tag = store.save(Tag::new("rust")).await.unwrap();
        store.tag_post(post.id, tag.id).await.unwrap();
        store.like_post(post.id, author.id).await.unwrap();
        store
            .save(Comment::new(post.id, author.id, "first"))
            .await
            .unwrap();

        BaseRepository::<Post, Uuid>::delete(store.as_ref(), post.id)
            .await
            .unwrap();

        assert!(store.for_post(post.id).await.unwrap().is_empty());
        assert_eq!(store.post_counts(&[tag.id]).await.unwrap()[&tag.id], 0);
        assert!(store.likes_counts(&[post.id]).await.unwrap()[&post.id] == 0);
    }

    #[tokio::test]
    async fn test_deleting_an_author_removes_their_posts() {
        let (store, author, post) = seeded().await;

        BaseRepository::<User, Uuid>::delete(store.as_ref(), author.id)
            .await
            .unwrap();

        let found = BaseRepository::<Post, Uuid>::find_by_id(store.as_ref(), post.id)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_comment_requires_live_post() {
        let (store, author, _) = seeded().await;
        let orphan = Comment::new(Uuid::new_v4(), author.id, "lost");
        assert!(matches!(
            store.save(orphan).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_a_query() {
        let (store, _, _) = seeded().await;
        assert!(store.likes_counts(&[]).await.unwrap().is_empty());
        assert!(store.comments_counts(&[]).await.unwrap().is_empty());
        assert!(store.post_counts(&[]).await.unwrap().is_empty());
        assert_eq!(store.count_queries(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_slug_resolves_to_newest() {
        let (store, author, older) = seeded().await;
        let newer = store
            .save(
                Post::new(author.id, "Hello again", "Body", "hello")
                    .published(older.published_at + chrono::Duration::hours(1)),
            )
            .await
            .unwrap();

        let found = store.find_by_slug("hello").await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);
    }
}
