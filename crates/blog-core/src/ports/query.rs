//! Explicit filter and paging parameters for listing queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Inclusive publication range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishedRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl PublishedRange {
    pub fn validate(&self) -> Result<(), DomainError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(DomainError::Validation(
                "published range starts after it ends".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// Admin post listing filter.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive match on title or author username.
    pub query: Option<String>,
    pub tag_id: Option<Uuid>,
    pub published: PublishedRange,
}

/// Admin comment listing filter.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// Case-insensitive match on author username, text or post title.
    pub query: Option<String>,
    pub published: PublishedRange,
}

const MAX_OFFSET: u64 = i64::MAX as u64;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Both values are at least 1, and `page * per_page` always fits in a
    /// signed 64-bit SQL offset.
    pub fn new(page: u64, per_page: u64) -> Self {
        let per_page = per_page.clamp(1, MAX_OFFSET);
        Self {
            page: page.clamp(1, MAX_OFFSET / per_page),
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(self.request.per_page)
    }
}
