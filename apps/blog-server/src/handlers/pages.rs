//! Public blog pages.

use actix_web::{HttpResponse, web};

use super::render_html;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let page = state.blog.home_feed().await?;
    render_html(&state, "index.html", &page)
}

/// GET /post/{slug}
pub async fn post_detail(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let page = state.blog.post_detail(&slug).await?;
    render_html(&state, "post-details.html", &page)
}

/// GET /tag/{tag_title}
pub async fn tag_filter(
    state: web::Data<AppState>,
    tag_title: web::Path<String>,
) -> AppResult<HttpResponse> {
    let page = state.blog.tag_filter(&tag_title).await?;
    render_html(&state, "posts-list.html", &page)
}

/// GET /contacts
pub async fn contacts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let page = state.blog.contacts().await?;
    render_html(&state, "contacts.html", &page)
}
