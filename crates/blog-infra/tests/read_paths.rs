//! Page assembly over the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag, User};
use blog_core::ports::{BaseRepository, CommentFilter, PostFilter, PublishedRange};
use blog_core::{AdminService, BlogService, DomainError, FeedSettings};
use blog_infra::InMemoryBlogStore;

struct Blog {
    store: Arc<InMemoryBlogStore>,
    feed: BlogService,
    admin: AdminService,
    author: User,
}

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

async fn blog() -> Blog {
    let store = Arc::new(InMemoryBlogStore::new());
    let author = store.save(User::new("alice", true)).await.unwrap();
    let repos = store.repositories();

    Blog {
        feed: BlogService::new(repos.clone(), FeedSettings::default()),
        admin: AdminService::new(repos, 2),
        store,
        author,
    }
}

impl Blog {
    async fn post(&self, slug: &str, hour: i64) -> Post {
        self.store
            .save(Post::new(self.author.id, slug.to_uppercase(), "Body text", slug).published(at(hour)))
            .await
            .unwrap()
    }

    async fn tag(&self, title: &str) -> Tag {
        self.store.save(Tag::new(title)).await.unwrap()
    }

    async fn reader(&self, name: &str) -> User {
        self.store.save(User::new(name, false)).await.unwrap()
    }

    async fn comment(&self, post: &Post, author: &User, text: &str, hour: i64) {
        self.store
            .save(Comment::new(post.id, author.id, text).published(at(hour)))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn similar_posts_share_at_least_one_tag() {
    let blog = blog().await;
    let python = blog.tag("python").await;
    let django = blog.tag("django").await;
    let go = blog.tag("go").await;

    let a = blog.post("a", 1).await;
    let b = blog.post("b", 2).await;
    let c = blog.post("c", 3).await;
    blog.store.tag_post(a.id, python.id).await.unwrap();
    blog.store.tag_post(a.id, django.id).await.unwrap();
    blog.store.tag_post(b.id, python.id).await.unwrap();
    blog.store.tag_post(c.id, go.id).await.unwrap();

    let similar = blog.feed.similar_posts(&a, 5).await.unwrap();
    let slugs: Vec<&str> = similar.iter().map(|p| p.post.slug.as_str()).collect();
    assert_eq!(slugs, vec!["b"]);

    let page = blog.feed.post_detail("a").await.unwrap();
    assert_eq!(page.similar_posts.len(), 1);
    assert_eq!(page.similar_posts[0].slug, "b");
}

#[tokio::test]
async fn similar_posts_rank_by_shared_tags() {
    let blog = blog().await;
    let rust = blog.tag("rust").await;
    let web = blog.tag("web").await;

    let source = blog.post("source", 1).await;
    let one_shared = blog.post("one", 5).await;
    let two_shared = blog.post("two", 2).await;
    for tag in [&rust, &web] {
        blog.store.tag_post(source.id, tag.id).await.unwrap();
        blog.store.tag_post(two_shared.id, tag.id).await.unwrap();
    }
    blog.store.tag_post(one_shared.id, rust.id).await.unwrap();

    let similar = blog.feed.similar_posts(&source, 5).await.unwrap();
    let slugs: Vec<&str> = similar.iter().map(|p| p.post.slug.as_str()).collect();
    assert_eq!(slugs, vec!["two", "one"]);
}

#[tokio::test]
async fn untagged_post_has_no_similar_posts() {
    let blog = blog().await;
    let lonely = blog.post("lonely", 1).await;
    blog.post("other", 2).await;

    assert!(blog.feed.similar_posts(&lonely, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_tag_is_not_found() {
    let blog = blog().await;

    let err = blog.feed.tag_filter("nonexistent").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "Tag", .. }));
}

#[tokio::test]
async fn tag_filter_matches_titles_case_insensitively() {
    let blog = blog().await;
    let rust = blog.tag("rust").await;
    let post = blog.post("tagged", 1).await;
    blog.store.tag_post(post.id, rust.id).await.unwrap();
    blog.post("untagged", 2).await;

    let page = blog.feed.tag_filter("Rust").await.unwrap();
    assert_eq!(page.tag, "rust");
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.posts[0].first_tag_title.as_deref(), Some("rust"));
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let blog = blog().await;

    let err = blog.feed.post_detail("missing").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "Post", .. }));
}

#[tokio::test]
async fn popular_posts_are_ranked_by_likes() {
    let blog = blog().await;
    let posts = [
        blog.post("quiet", 1).await,
        blog.post("loved", 2).await,
        blog.post("liked", 3).await,
    ];
    let readers = [
        blog.reader("bob").await,
        blog.reader("carol").await,
        blog.reader("dave").await,
    ];
    for reader in &readers {
        blog.store.like_post(posts[1].id, reader.id).await.unwrap();
    }
    blog.store.like_post(posts[2].id, readers[0].id).await.unwrap();

    let popular = blog.feed.popular_posts(5).await.unwrap();
    let likes: Vec<u64> = popular.iter().map(|p| p.likes_count.unwrap()).collect();
    assert_eq!(likes, vec![3, 1, 0]);
    assert!(likes.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(popular[0].post.slug, "loved");
}

#[tokio::test]
async fn comment_counts_include_zero() {
    let blog = blog().await;
    let busy = blog.post("busy", 1).await;
    let silent = blog.post("silent", 2).await;
    let bob = blog.reader("bob").await;
    blog.comment(&busy, &bob, "one", 3).await;
    blog.comment(&busy, &bob, "two", 4).await;

    let annotated = blog
        .feed
        .annotate_posts(vec![busy.clone(), silent.clone()], None)
        .await
        .unwrap();

    assert_eq!(annotated[0].comments_count, Some(2));
    assert_eq!(annotated[1].comments_count, Some(0));
}

#[tokio::test]
async fn post_without_tags_serializes_empty() {
    let blog = blog().await;
    blog.post("plain", 1).await;

    let home = blog.feed.home_feed().await.unwrap();
    let plain = &home.page_posts[0];
    assert!(plain.tags.is_empty());
    assert_eq!(plain.first_tag_title, None);
    assert_eq!(plain.image_url, None);
}

#[tokio::test]
async fn annotated_posts_serialize_without_count_queries() {
    let blog = blog().await;
    let rust = blog.tag("rust").await;
    for (i, slug) in ["a", "b", "c"].iter().enumerate() {
        let post = blog.post(slug, i as i64).await;
        blog.store.tag_post(post.id, rust.id).await.unwrap();
    }

    let posts = blog.feed.recent_posts(5).await.unwrap();
    let before = blog.store.count_queries();
    let summaries = blog.feed.serialize_posts(&posts).await.unwrap();

    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.tags[0].posts_with_tag == 3));
    assert_eq!(blog.store.count_queries(), before);
}

#[tokio::test]
async fn home_feed_lists_recent_posts_newest_first() {
    let blog = blog().await;
    for hour in 0..7 {
        blog.post(&format!("post-{hour}"), hour).await;
    }

    let home = blog.feed.home_feed().await.unwrap();
    let slugs: Vec<&str> = home.page_posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["post-6", "post-5", "post-4", "post-3", "post-2"]);
    assert_eq!(home.sidebar.most_popular_posts.len(), 5);
}

#[tokio::test]
async fn post_detail_lists_comments_oldest_first() {
    let blog = blog().await;
    let post = blog.post("hello", 1).await;
    let bob = blog.reader("bob").await;
    blog.comment(&post, &bob, "later", 5).await;
    blog.comment(&post, &bob, "earlier", 2).await;
    blog.store.like_post(post.id, bob.id).await.unwrap();

    let page = blog.feed.post_detail("hello").await.unwrap();
    let texts: Vec<&str> = page.post.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["earlier", "later"]);
    assert_eq!(page.post.comments[0].author, "bob");
    assert_eq!(page.post.author, "alice");
    assert_eq!(page.post.likes_amount, 1);
}

#[tokio::test]
async fn admin_posts_are_paginated_with_counts() {
    let blog = blog().await;
    let first = blog.post("first", 1).await;
    blog.post("second", 2).await;
    blog.post("third", 3).await;
    let bob = blog.reader("bob").await;
    blog.store.like_post(first.id, bob.id).await.unwrap();
    blog.comment(&first, &bob, "hi", 4).await;

    let page = blog.admin.posts(&PostFilter::default(), Some(2)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "FIRST");
    assert_eq!(page.items[0].likes_count, 1);
    assert_eq!(page.items[0].comments_count, 1);
}

#[tokio::test]
async fn admin_post_search_matches_author_username() {
    let blog = blog().await;
    blog.post("mine", 1).await;

    let filter = PostFilter {
        query: Some("ALI".to_string()),
        ..PostFilter::default()
    };
    assert_eq!(blog.admin.posts(&filter, None).await.unwrap().total, 1);

    let filter = PostFilter {
        query: Some("nobody".to_string()),
        ..PostFilter::default()
    };
    assert_eq!(blog.admin.posts(&filter, None).await.unwrap().total, 0);
}

#[tokio::test]
async fn admin_page_past_the_end_is_empty() {
    let blog = blog().await;
    blog.post("only", 1).await;

    let page = blog
        .admin
        .posts(&PostFilter::default(), Some(u64::MAX))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn admin_rejects_inverted_date_range() {
    let blog = blog().await;
    let filter = PostFilter {
        published: PublishedRange {
            from: Some(at(10)),
            to: Some(at(1)),
        },
        ..PostFilter::default()
    };

    let err = blog.admin.posts(&filter, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn admin_tags_carry_post_counts() {
    let blog = blog().await;
    let rust = blog.tag("rust").await;
    blog.tag("unused").await;
    let post = blog.post("p", 1).await;
    blog.store.tag_post(post.id, rust.id).await.unwrap();

    let page = blog.admin.tags(None, None).await.unwrap();
    let counts: Vec<(&str, u64)> = page
        .items
        .iter()
        .map(|t| (t.title.as_str(), t.posts_count))
        .collect();
    assert_eq!(counts, vec![("rust", 1), ("unused", 0)]);
}

#[tokio::test]
async fn admin_comments_show_truncated_preview() {
    let blog = blog().await;
    let post = blog.post("p", 1).await;
    let bob = blog.reader("bob").await;
    blog.comment(&post, &bob, &"x".repeat(150), 2).await;

    let page = blog
        .admin
        .comments(&CommentFilter::default(), None)
        .await
        .unwrap();
    let row = &page.items[0];
    assert_eq!(row.author, "bob");
    assert_eq!(row.post_title, "P");
    assert_eq!(row.text_preview.chars().count(), 103);
    assert!(row.text_preview.ends_with("..."));
}

#[tokio::test]
async fn admin_post_detail_lists_tags() {
    let blog = blog().await;
    let post = blog.post("p", 1).await;
    let web = blog.tag("web").await;
    let api = blog.tag("api").await;
    blog.store.tag_post(post.id, web.id).await.unwrap();
    blog.store.tag_post(post.id, api.id).await.unwrap();

    let detail = blog.admin.post(post.id).await.unwrap();
    assert_eq!(detail.tags, vec!["api", "web"]);
    assert_eq!(detail.slug, "p");

    let err = blog.admin.post(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn deleting_a_post_removes_it_from_every_page() {
    let blog = blog().await;
    let rust = blog.tag("rust").await;
    let post = blog.post("doomed", 1).await;
    let bob = blog.reader("bob").await;
    blog.store.tag_post(post.id, rust.id).await.unwrap();
    blog.comment(&post, &bob, "bye", 2).await;

    BaseRepository::<Post, Uuid>::delete(blog.store.as_ref(), post.id)
        .await
        .unwrap();

    assert!(blog.feed.home_feed().await.unwrap().page_posts.is_empty());
    assert!(blog.feed.tag_filter("rust").await.unwrap().posts.is_empty());
    assert_eq!(blog.admin.comments(&CommentFilter::default(), None).await.unwrap().total, 0);
}
