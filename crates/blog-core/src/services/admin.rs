//! Admin listings: posts, tags and comments with batch-annotated counts.

use std::collections::HashMap;

use uuid::Uuid;

use blog_shared::dto::{AdminCommentRow, AdminPage, AdminPostDetail, AdminPostRow, AdminTagRow};

use super::{Repositories, text_preview, unique_ids};
use crate::domain::Post;
use crate::error::{DomainError, RepoError};
use crate::ports::{CommentFilter, Page, PageRequest, PostFilter};

const COMMENT_PREVIEW_CHARS: usize = 100;

/// Read service behind the admin listings.
#[derive(Clone)]
pub struct AdminService {
    repos: Repositories,
    per_page: u64,
}

impl AdminService {
    pub fn new(repos: Repositories, per_page: u64) -> Self {
        Self { repos, per_page }
    }

    fn page_request(&self, page: Option<u64>) -> PageRequest {
        PageRequest::new(page.unwrap_or(1), self.per_page)
    }

    pub async fn posts(
        &self,
        filter: &PostFilter,
        page: Option<u64>,
    ) -> Result<AdminPage<AdminPostRow>, DomainError> {
        filter.published.validate()?;

        let page = self
            .repos
            .posts
            .search(filter, self.page_request(page))
            .await?;
        let rows = self.post_rows(&page.items).await?;

        Ok(envelope(&page, rows))
    }

    pub async fn post(&self, id: Uuid) -> Result<AdminPostDetail, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id.to_string()))?;

        let tags = self
            .repos
            .tags
            .for_posts(&[post.id])
            .await?
            .into_iter()
            .map(|(_, tag)| tag.title)
            .collect();

        let mut rows = self.post_rows(std::slice::from_ref(&post)).await?;
        let row = rows.pop().ok_or(RepoError::NotFound)?;

        Ok(AdminPostDetail {
            row,
            slug: post.slug,
            text: post.text,
            image: post.image,
            tags,
        })
    }

    pub async fn tags(
        &self,
        query: Option<&str>,
        page: Option<u64>,
    ) -> Result<AdminPage<AdminTagRow>, DomainError> {
        let page = self
            .repos
            .tags
            .search(query, self.page_request(page))
            .await?;

        let ids: Vec<Uuid> = page.items.iter().map(|t| t.id).collect();
        let counts = self.repos.tags.post_counts(&ids).await?;

        let rows = page
            .items
            .iter()
            .map(|tag| AdminTagRow {
                id: tag.id,
                title: tag.title.clone(),
                posts_count: counts.get(&tag.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(envelope(&page, rows))
    }

    pub async fn comments(
        &self,
        filter: &CommentFilter,
        page: Option<u64>,
    ) -> Result<AdminPage<AdminCommentRow>, DomainError> {
        filter.published.validate()?;

        let page = self
            .repos
            .comments
            .search(filter, self.page_request(page))
            .await?;

        let author_ids = unique_ids(page.items.iter().map(|c| c.author_id));
        let authors = self.repos.users.usernames(&author_ids).await?;

        let post_ids = unique_ids(page.items.iter().map(|c| c.post_id));
        let titles: HashMap<Uuid, String> = self
            .repos
            .posts
            .find_by_ids(&post_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.title))
            .collect();

        let rows = page
            .items
            .iter()
            .map(|comment| AdminCommentRow {
                id: comment.id,
                author: authors.get(&comment.author_id).cloned().unwrap_or_default(),
                post_id: comment.post_id,
                post_title: titles.get(&comment.post_id).cloned().unwrap_or_default(),
                text_preview: text_preview(&comment.text, COMMENT_PREVIEW_CHARS),
                published_at: comment.published_at,
            })
            .collect();

        Ok(envelope(&page, rows))
    }

    /// Rows for a batch of posts: one likes query, one comments query and one
    /// username query for the whole batch.
    async fn post_rows(&self, posts: &[Post]) -> Result<Vec<AdminPostRow>, RepoError> {
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let likes = self.repos.posts.likes_counts(&ids).await?;
        let comments = self.repos.posts.comments_counts(&ids).await?;

        let author_ids = unique_ids(posts.iter().map(|p| p.author_id));
        let authors = self.repos.users.usernames(&author_ids).await?;

        Ok(posts
            .iter()
            .map(|post| AdminPostRow {
                id: post.id,
                title: post.title.clone(),
                author: authors.get(&post.author_id).cloned().unwrap_or_default(),
                published_at: post.published_at,
                likes_count: likes.get(&post.id).copied().unwrap_or(0),
                comments_count: comments.get(&post.id).copied().unwrap_or(0),
            })
            .collect())
    }
}

fn envelope<T, R>(page: &Page<T>, items: Vec<R>) -> AdminPage<R> {
    AdminPage {
        items,
        total: page.total,
        page: page.request.page,
        per_page: page.request.per_page,
        pages: page.pages(),
    }
}
