//! Flattening view models into template contexts.

use uuid::Uuid;

use blog_shared::dto::{PostSummary, TagSummary};

use super::BlogService;
use crate::error::RepoError;
use crate::read_model::{AnnotatedPost, AnnotatedTag, CountMap};

impl BlogService {
    /// Serialize a post. Counts carried by the annotation are used as-is; a
    /// count query runs only for a count that was never annotated.
    pub async fn serialize_post(&self, post: &AnnotatedPost) -> Result<PostSummary, RepoError> {
        let id = post.post.id;

        let likes_amount = match post.likes_count {
            Some(count) => count,
            None => count_of(&self.repos.posts.likes_counts(&[id]).await?, id),
        };
        let comments_amount = match post.comments_count {
            Some(count) => count,
            None => count_of(&self.repos.posts.comments_counts(&[id]).await?, id),
        };

        Ok(PostSummary {
            title: post.post.title.clone(),
            teaser_text: teaser(&post.post.text, self.settings.teaser_chars),
            author: post.author.clone(),
            comments_amount,
            image_url: image_url(&self.settings.media_url, post.post.image.as_deref()),
            published_at: post.post.published_at,
            slug: post.post.slug.clone(),
            tags: self.serialize_tags(&post.tags).await?,
            first_tag_title: post.first_tag_title().map(str::to_owned),
            likes_amount,
        })
    }

    pub async fn serialize_posts(
        &self,
        posts: &[AnnotatedPost],
    ) -> Result<Vec<PostSummary>, RepoError> {
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            out.push(self.serialize_post(post).await?);
        }
        Ok(out)
    }

    pub async fn serialize_tag(&self, tag: &AnnotatedTag) -> Result<TagSummary, RepoError> {
        let posts_with_tag = match tag.posts_count {
            Some(count) => count,
            None => count_of(&self.repos.tags.post_counts(&[tag.tag.id]).await?, tag.tag.id),
        };

        Ok(TagSummary {
            title: tag.tag.title.clone(),
            posts_with_tag,
        })
    }

    pub async fn serialize_tags(&self, tags: &[AnnotatedTag]) -> Result<Vec<TagSummary>, RepoError> {
        let mut out = Vec::with_capacity(tags.len());
        for tag in tags {
            out.push(self.serialize_tag(tag).await?);
        }
        Ok(out)
    }
}

fn count_of(counts: &CountMap, id: Uuid) -> u64 {
    counts.get(&id).copied().unwrap_or(0)
}

/// First `chars` characters of `text`.
pub fn teaser(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Like [`teaser`], with a trailing `...` when the text was cut.
pub fn text_preview(text: &str, chars: usize) -> String {
    if text.chars().count() > chars {
        format!("{}...", teaser(text, chars))
    } else {
        text.to_string()
    }
}

/// Public URL of an image stored under the media root.
pub fn image_url(media_url: &str, image: Option<&str>) -> Option<String> {
    let image = image.map(str::trim).filter(|i| !i.is_empty())?;
    Some(format!(
        "{}/{}",
        media_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teaser_respects_char_boundaries() {
        assert_eq!(teaser("Привет, мир", 6), "Привет");
        assert_eq!(teaser("short", 200), "short");
    }

    #[test]
    fn test_text_preview_marks_cut_text() {
        assert_eq!(text_preview("abcdef", 3), "abc...");
        assert_eq!(text_preview("abc", 3), "abc");
    }

    #[test]
    fn test_image_url_joins_media_prefix() {
        assert_eq!(
            image_url("/media/", Some("covers/a.png")).as_deref(),
            Some("/media/covers/a.png")
        );
        assert_eq!(
            image_url("https://cdn.example.com/media", Some("/b.jpg")).as_deref(),
            Some("https://cdn.example.com/media/b.jpg")
        );
        assert_eq!(image_url("/media/", Some("")), None);
        assert_eq!(image_url("/media/", None), None);
    }
}
