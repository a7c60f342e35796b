//! HTTP handlers and route configuration.

mod admin;
mod health;
mod pages;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(pages::index))
        .route("/post/{slug}", web::get().to(pages::post_detail))
        .route("/tag/{tag_title}", web::get().to(pages::tag_filter))
        .route("/contacts", web::get().to(pages::contacts))
        .service(
            web::scope("/admin")
                .route("/posts", web::get().to(admin::posts))
                .route("/posts/{id}", web::get().to(admin::post))
                .route("/tags", web::get().to(admin::tags))
                .route("/comments", web::get().to(admin::comments)),
        )
        .service(web::scope("/api").route("/health", web::get().to(health::health_check)));
}

fn render_html<T: Serialize>(state: &AppState, template: &str, page: &T) -> AppResult<HttpResponse> {
    let body = state.renderer.render(template, page)?;
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(body))
}
