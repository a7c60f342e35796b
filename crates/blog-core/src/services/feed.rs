//! Public page assembly: home feed, post detail, tag filter, contacts.

use std::collections::HashMap;

use uuid::Uuid;

use blog_shared::dto::{
    CommentEntry, ContactPage, HomePage, PostDetail, PostPage, Sidebar, TagPage,
};

use super::{FeedSettings, Repositories, unique_ids};
use crate::domain::{Post, Tag};
use crate::error::{DomainError, RepoError};
use crate::read_model::{AnnotatedPost, AnnotatedTag, CountMap};

/// Read service behind the public pages.
#[derive(Clone)]
pub struct BlogService {
    pub(super) repos: Repositories,
    pub(super) settings: FeedSettings,
}

impl BlogService {
    pub fn new(repos: Repositories, settings: FeedSettings) -> Self {
        Self { repos, settings }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Attach counts, tags and author names to a batch of posts.
    ///
    /// Issues a fixed number of queries whatever the batch size. `likes` is
    /// reused when the caller already computed it (e.g. while ranking).
    pub async fn annotate_posts(
        &self,
        posts: Vec<Post>,
        likes: Option<CountMap>,
    ) -> Result<Vec<AnnotatedPost>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let likes = match likes {
            Some(likes) => likes,
            None => self.repos.posts.likes_counts(&ids).await?,
        };
        let comments = self.repos.posts.comments_counts(&ids).await?;

        let tag_links = self.repos.tags.for_posts(&ids).await?;
        let tag_ids = unique_ids(tag_links.iter().map(|(_, tag)| tag.id));
        let tag_counts = self.repos.tags.post_counts(&tag_ids).await?;

        let author_ids = unique_ids(posts.iter().map(|p| p.author_id));
        let authors = self.repos.users.usernames(&author_ids).await?;

        let mut tags_by_post: HashMap<Uuid, Vec<AnnotatedTag>> = HashMap::new();
        for (post_id, tag) in tag_links {
            let count = tag_counts.get(&tag.id).copied();
            tags_by_post
                .entry(post_id)
                .or_default()
                .push(AnnotatedTag::new(tag, count));
        }

        Ok(posts
            .into_iter()
            .map(|post| AnnotatedPost {
                author: authors.get(&post.author_id).cloned().unwrap_or_default(),
                tags: tags_by_post.remove(&post.id).unwrap_or_default(),
                likes_count: likes.get(&post.id).copied(),
                comments_count: comments.get(&post.id).copied(),
                post,
            })
            .collect())
    }

    /// Most liked posts, most likes first.
    pub async fn popular_posts(&self, limit: u64) -> Result<Vec<AnnotatedPost>, RepoError> {
        let ranking = self.repos.posts.most_liked(limit).await?;
        let ids: Vec<Uuid> = ranking.iter().map(|(id, _)| *id).collect();

        let posts = self.repos.posts.find_by_ids(&ids).await?;
        let likes: CountMap = ranking.into_iter().collect();
        let annotated = self.annotate_posts(posts, Some(likes)).await?;

        Ok(in_rank_order(annotated, &ids))
    }

    pub async fn recent_posts(&self, limit: u64) -> Result<Vec<AnnotatedPost>, RepoError> {
        let posts = self.repos.posts.recent(limit).await?;
        self.annotate_posts(posts, None).await
    }

    /// Posts sharing tags with `post`, most shared tags first.
    pub async fn similar_posts(
        &self,
        post: &Post,
        limit: u64,
    ) -> Result<Vec<AnnotatedPost>, RepoError> {
        let ids = self.repos.posts.similar(post.id, limit).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self.repos.posts.find_by_ids(&ids).await?;
        let annotated = self.annotate_posts(posts, None).await?;

        Ok(in_rank_order(annotated, &ids))
    }

    /// Most used tags, most posts first.
    pub async fn popular_tags(&self, limit: u64) -> Result<Vec<AnnotatedTag>, RepoError> {
        let ranking = self.repos.tags.most_used(limit).await?;
        Ok(ranking
            .into_iter()
            .map(|(tag, count)| AnnotatedTag::new(tag, Some(count)))
            .collect())
    }

    /// Popular posts and tags shown on every public page.
    pub async fn sidebar(&self) -> Result<Sidebar, RepoError> {
        let posts = self.popular_posts(self.settings.popular_limit).await?;
        let tags = self.popular_tags(self.settings.popular_limit).await?;

        Ok(Sidebar {
            most_popular_posts: self.serialize_posts(&posts).await?,
            popular_tags: self.serialize_tags(&tags).await?,
        })
    }

    pub async fn home_feed(&self) -> Result<HomePage, DomainError> {
        let sidebar = self.sidebar().await?;
        let fresh = self.recent_posts(self.settings.recent_limit).await?;

        Ok(HomePage {
            sidebar,
            page_posts: self.serialize_posts(&fresh).await?,
        })
    }

    pub async fn post_detail(&self, slug: &str) -> Result<PostPage, DomainError> {
        tracing::debug!(slug, "Loading post detail");

        let post = self
            .repos
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", slug))?;

        let comments = self.repos.comments.for_post(post.id).await?;
        let user_ids = unique_ids(
            std::iter::once(post.author_id).chain(comments.iter().map(|c| c.author_id)),
        );
        let usernames = self.repos.users.usernames(&user_ids).await?;
        let username = |id: &Uuid| usernames.get(id).cloned().unwrap_or_default();

        let likes = self.repos.posts.likes_counts(&[post.id]).await?;

        let tags: Vec<Tag> = self
            .repos
            .tags
            .for_posts(&[post.id])
            .await?
            .into_iter()
            .map(|(_, tag)| tag)
            .collect();
        let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
        let tag_counts = self.repos.tags.post_counts(&tag_ids).await?;
        let tags: Vec<AnnotatedTag> = tags
            .into_iter()
            .map(|tag| {
                let count = tag_counts.get(&tag.id).copied();
                AnnotatedTag::new(tag, count)
            })
            .collect();

        let similar = self
            .similar_posts(&post, self.settings.similar_limit)
            .await?;

        let detail = PostDetail {
            title: post.title.clone(),
            text: post.text.clone(),
            author: username(&post.author_id),
            comments: comments
                .iter()
                .map(|c| CommentEntry {
                    text: c.text.clone(),
                    published_at: c.published_at,
                    author: username(&c.author_id),
                })
                .collect(),
            likes_amount: likes.get(&post.id).copied().unwrap_or(0),
            image_url: super::image_url(&self.settings.media_url, post.image.as_deref()),
            published_at: post.published_at,
            slug: post.slug.clone(),
            tags: self.serialize_tags(&tags).await?,
        };

        Ok(PostPage {
            sidebar: self.sidebar().await?,
            post: detail,
            similar_posts: self.serialize_posts(&similar).await?,
        })
    }

    pub async fn tag_filter(&self, tag_title: &str) -> Result<TagPage, DomainError> {
        let tag = self
            .repos
            .tags
            .find_by_title(&Tag::normalize_title(tag_title))
            .await?
            .ok_or_else(|| DomainError::not_found("Tag", tag_title))?;

        let posts = self
            .repos
            .posts
            .with_tag(tag.id, self.settings.tag_posts_limit)
            .await?;
        let posts = self.annotate_posts(posts, None).await?;

        Ok(TagPage {
            sidebar: self.sidebar().await?,
            tag: tag.title,
            posts: self.serialize_posts(&posts).await?,
        })
    }

    pub async fn contacts(&self) -> Result<ContactPage, DomainError> {
        Ok(ContactPage {
            sidebar: self.sidebar().await?,
        })
    }
}

/// Restore the ranking order after fetching rows by id.
fn in_rank_order(mut posts: Vec<AnnotatedPost>, ids: &[Uuid]) -> Vec<AnnotatedPost> {
    let rank: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    posts.sort_by_key(|p| rank.get(&p.post.id).copied().unwrap_or(usize::MAX));
    posts
}
