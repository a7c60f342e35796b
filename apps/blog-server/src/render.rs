//! HTML rendering with templates compiled into the binary.

use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("post_card.html", include_str!("../templates/post_card.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("post-details.html", include_str!("../templates/post-details.html")),
    ("posts-list.html", include_str!("../templates/posts-list.html")),
    ("contacts.html", include_str!("../templates/contacts.html")),
    ("admin/base.html", include_str!("../templates/admin/base.html")),
    ("admin/posts.html", include_str!("../templates/admin/posts.html")),
    ("admin/post.html", include_str!("../templates/admin/post.html")),
    ("admin/tags.html", include_str!("../templates/admin/tags.html")),
    ("admin/comments.html", include_str!("../templates/admin/comments.html")),
];

/// Renders page data into HTML.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render `template` with the fields of `page` as top-level variables.
    pub fn render<T: Serialize>(&self, template: &str, page: &T) -> Result<String, tera::Error> {
        let context = Context::from_serialize(page)?;
        self.tera.render(template, &context)
    }
}
