use std::collections::BTreeMap;
use std::sync::Arc;

use sea_orm::{DatabaseBackend, DbConn, DbErr, MockDatabase, RuntimeErr, Transaction, Value};
use uuid::Uuid;

use blog_core::domain::Post;
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PageRequest, PostFilter, PostRepository, TagRepository};

use super::entity::{post, tag};
use super::postgres_base::query_err;
use super::postgres_repo::{PostgresPostRepository, PostgresTagRepository, like_pattern};

/// Statements executed on a connection no repository holds any more.
fn transaction_log(db: Arc<DbConn>) -> Vec<Transaction> {
    Arc::try_unwrap(db)
        .ok()
        .expect("connection still shared")
        .into_transaction_log()
}

/// Logged statements as plain SQL text, quotes unescaped.
fn logged_sql(log: &[Transaction]) -> String {
    format!("{log:?}").replace("\\\"", "\"")
}

fn count_row(id: Uuid, total: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("id", Value::from(id)), ("total", Value::from(total))])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            author_id,
            title: "Test Post".to_owned(),
            text: "Content".to_owned(),
            slug: "test-post".to_owned(),
            image: None,
            published_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_likes_counts_fill_missing_ids_with_zero() {
    let liked = Uuid::new_v4();
    let unliked = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(liked, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let counts = repo.likes_counts(&[liked, unliked]).await.unwrap();

    assert_eq!(counts.len(), 2);
    assert_eq!(counts[&liked], 3);
    assert_eq!(counts[&unliked], 0);
}

#[tokio::test]
async fn test_count_batch_is_a_single_grouped_query() {
    let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(ids[0], 1), count_row(ids[2], 4)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let counts = repo.comments_counts(&ids).await.unwrap();
    assert_eq!(counts[&ids[1]], 0);

    let log = transaction_log(repo.db);
    assert_eq!(log.len(), 1);
    let sql = logged_sql(&log);
    assert!(sql.contains("GROUP BY"));
}

#[tokio::test]
async fn test_empty_batch_issues_no_query() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let posts = PostgresPostRepository::shared(db.clone());
    let tags = PostgresTagRepository::shared(db.clone());

    assert!(posts.likes_counts(&[]).await.unwrap().is_empty());
    assert!(posts.comments_counts(&[]).await.unwrap().is_empty());
    assert!(tags.post_counts(&[]).await.unwrap().is_empty());
    assert!(tags.for_posts(&[]).await.unwrap().is_empty());

    drop(posts);
    drop(tags);
    assert!(transaction_log(db).is_empty());
}

#[tokio::test]
async fn test_similar_posts_query_shape() {
    let source = Uuid::new_v4();
    let other = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![BTreeMap::from([("post_id", Value::from(other))])]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert_eq!(repo.similar(source, 5).await.unwrap(), vec![other]);

    let sql = logged_sql(&transaction_log(repo.db));
    assert!(sql.contains(r#""post_tags"."tag_id" IN (SELECT "tag_id" FROM "post_tags""#));
    assert!(sql.contains(r#""post_tags"."post_id" <> $2"#));
    assert!(sql.contains(r#"GROUP BY "post_tags"."post_id""#));
    assert!(sql.contains(
        r#"ORDER BY COUNT("post_tags"."tag_id") DESC, "posts"."published_at" DESC"#
    ));
    assert!(sql.contains("LIMIT $3"));
}

#[tokio::test]
async fn test_most_liked_keeps_posts_without_likes() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(post_id, 0)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert_eq!(repo.most_liked(5).await.unwrap(), vec![(post_id, 0)]);

    let sql = logged_sql(&transaction_log(repo.db));
    assert!(sql.contains(r#"LEFT JOIN "post_likes""#));
    assert!(sql.contains(
        r#"ORDER BY COUNT("post_likes"."user_id") DESC, "posts"."published_at" DESC"#
    ));
    assert!(sql.contains("LIMIT"));
}

#[tokio::test]
async fn test_post_search_escapes_wildcards() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![BTreeMap::from([("num_items", Value::from(0i64))])]])
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let filter = PostFilter {
        query: Some("Ab%".to_string()),
        ..PostFilter::default()
    };
    let page = repo.search(&filter, PageRequest::new(1, 50)).await.unwrap();
    assert_eq!(page.total, 0);

    let sql = logged_sql(&transaction_log(repo.db));
    assert!(sql.contains("ESCAPE"));
    assert!(sql.contains(r#"ORDER BY "posts"."published_at" DESC"#));
}

#[test]
fn test_like_pattern_matches_metacharacters_literally() {
    assert_eq!(like_pattern(" Ab%"), r"%ab\%%");
    assert_eq!(like_pattern("snake_case"), r"%snake\_case%");
    assert_eq!(like_pattern("rust"), "%rust%");
}

#[tokio::test]
async fn test_find_tag_by_title() {
    let tag_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![tag::Model {
            id: tag_id,
            title: "rust".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let tag = repo.find_by_title("rust").await.unwrap().unwrap();

    assert_eq!(tag.id, tag_id);
    assert_eq!(tag.title, "rust");
}

#[tokio::test]
async fn test_most_used_tags_keep_query_order() {
    let rust = Uuid::new_v4();
    let go = Uuid::new_v4();
    let row = |id: Uuid, title: &str, total: i64| {
        BTreeMap::from([
            ("id", Value::from(id)),
            ("title", Value::from(title.to_owned())),
            ("total", Value::from(total)),
        ])
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row(rust, "rust", 7), row(go, "go", 2)]])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let tags = repo.most_used(5).await.unwrap();

    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].0.title, "rust");
    assert_eq!(tags[0].1, 7);
    assert_eq!(tags[1].1, 2);
}

#[test]
fn test_query_err_classifies_constraint_violations() {
    let err = query_err(DbErr::Query(RuntimeErr::Internal(
        "duplicate key value violates unique constraint \"tags_title_key\"".to_string(),
    )));
    assert!(matches!(err, RepoError::Constraint(_)));

    let err = query_err(DbErr::Query(RuntimeErr::Internal(
        "value too long for type character varying(20)".to_string(),
    )));
    assert!(matches!(err, RepoError::Constraint(_)));

    let err = query_err(DbErr::Query(RuntimeErr::Internal("syntax error".to_string())));
    assert!(matches!(err, RepoError::Query(_)));
}
