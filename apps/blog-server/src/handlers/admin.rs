//! Read-only administration listings.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blog_core::ports::{CommentFilter, PostFilter, PublishedRange};

use super::render_html;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Query string of the post listing.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub q: Option<String>,
    pub tag: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
}

/// Query string of the tag and comment listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
}

/// Active listing filters, echoed back so the paginator links keep them.
#[derive(Debug, Default, Serialize)]
struct ListingFilters {
    q: Option<String>,
    tag: Option<Uuid>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct Listing<T> {
    #[serde(flatten)]
    page: T,
    filters: ListingFilters,
}

/// GET /admin/posts
pub async fn posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = PostFilter {
        query: query.q.clone(),
        tag_id: query.tag,
        published: PublishedRange {
            from: query.from,
            to: query.to,
        },
    };

    let page = state.admin.posts(&filter, query.page).await?;
    let filters = ListingFilters {
        q: query.q,
        tag: query.tag,
        from: query.from,
        to: query.to,
    };
    render_html(&state, "admin/posts.html", &Listing { page, filters })
}

/// GET /admin/posts/{id}
pub async fn post(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let detail = state.admin.post(id.into_inner()).await?;
    render_html(&state, "admin/post.html", &detail)
}

/// GET /admin/tags
pub async fn tags(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let page = state.admin.tags(query.q.as_deref(), query.page).await?;
    let filters = ListingFilters {
        q: query.q,
        ..ListingFilters::default()
    };
    render_html(&state, "admin/tags.html", &Listing { page, filters })
}

/// GET /admin/comments
pub async fn comments(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = CommentFilter {
        query: query.q.clone(),
        published: PublishedRange {
            from: query.from,
            to: query.to,
        },
    };

    let page = state.admin.comments(&filter, query.page).await?;
    let filters = ListingFilters {
        q: query.q,
        from: query.from,
        to: query.to,
        ..ListingFilters::default()
    };
    render_html(&state, "admin/comments.html", &Listing { page, filters })
}
