//! PostgreSQL repository implementations.
//!
//! Every count is a single grouped query over an `IN (...)` list of ids; an
//! empty batch returns before touching the database.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag};
use blog_core::error::RepoError;
use blog_core::ports::{
    CommentFilter, CommentRepository, Page, PageRequest, PostFilter, PostRepository,
    PublishedRange, TagRepository, UserRepository,
};
use blog_core::read_model::{CountMap, count_map};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// `id, total` row of a grouped count.
#[derive(Debug, FromQueryResult)]
struct CountRow {
    id: Uuid,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct TagCountRow {
    id: Uuid,
    title: String,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct IdRow {
    post_id: Uuid,
}

fn to_count(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}

fn to_count_map(ids: &[Uuid], rows: Vec<CountRow>) -> CountMap {
    count_map(ids, rows.into_iter().map(|r| (r.id, to_count(r.total))))
}

/// Case-insensitive substring match; `%` and `_` in the needle match literally.
fn icontains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(like_pattern(needle)).escape('\\'))
}

/// `%needle%` with LIKE metacharacters escaped by `\`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::from("%");
    for c in needle.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_term(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

fn within<E, C>(select: Select<E>, column: C, range: &PublishedRange) -> Select<E>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let select = match range.from {
        Some(from) => select.filter(column.gte(from)),
        None => select,
    };
    match range.to {
        Some(to) => select.filter(column.lte(to)),
        None => select,
    }
}

async fn paged<E, T>(
    select: Select<E>,
    db: &sea_orm::DbConn,
    request: PageRequest,
) -> Result<Page<T>, RepoError>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    T: From<E::Model>,
{
    let paginator = select.paginate(db, request.per_page);
    let total = paginator.num_items().await.map_err(query_err)?;
    let items = paginator
        .fetch_page(request.page - 1)
        .await
        .map_err(query_err)?;

    Ok(Page {
        items: items.into_iter().map(Into::into).collect(),
        total,
        request,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        tracing::debug!(slug, "Finding post by slug");

        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .order_by_desc(post::Column::PublishedAt)
            .one(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = PostEntity::find()
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn with_tag(&self, tag_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::PostTag.def())
            .filter(post_tag::Column::TagId.eq(tag_id))
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn most_liked(&self, limit: u64) -> Result<Vec<(Uuid, u64)>, RepoError> {
        let likes = || Expr::col((PostLikeEntity, post_like::Column::UserId)).count();

        let rows = PostEntity::find()
            .select_only()
            .column(post::Column::Id)
            .column_as(likes(), "total")
            .join(JoinType::LeftJoin, post::Relation::PostLike.def())
            .group_by(post::Column::Id)
            .order_by_desc(likes())
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .into_model::<CountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|r| (r.id, to_count(r.total))).collect())
    }

    async fn likes_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if ids.is_empty() {
            return Ok(CountMap::new());
        }

        let rows = PostLikeEntity::find()
            .select_only()
            .column_as(post_like::Column::PostId, "id")
            .column_as(
                Expr::col((PostLikeEntity, post_like::Column::UserId)).count(),
                "total",
            )
            .filter(post_like::Column::PostId.is_in(ids.iter().copied()))
            .group_by(post_like::Column::PostId)
            .into_model::<CountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(to_count_map(ids, rows))
    }

    async fn comments_counts(&self, ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if ids.is_empty() {
            return Ok(CountMap::new());
        }

        let rows = CommentEntity::find()
            .select_only()
            .column_as(comment::Column::PostId, "id")
            .column_as(Expr::col((CommentEntity, comment::Column::Id)).count(), "total")
            .filter(comment::Column::PostId.is_in(ids.iter().copied()))
            .group_by(comment::Column::PostId)
            .into_model::<CountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(to_count_map(ids, rows))
    }

    async fn similar(&self, post_id: Uuid, limit: u64) -> Result<Vec<Uuid>, RepoError> {
        let source_tags = Query::select()
            .column(post_tag::Column::TagId)
            .from(PostTagEntity)
            .and_where(post_tag::Column::PostId.eq(post_id))
            .to_owned();

        let rows = PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::PostId)
            .join(JoinType::InnerJoin, post_tag::Relation::Post.def())
            .filter(post_tag::Column::TagId.in_subquery(source_tags))
            .filter(post_tag::Column::PostId.ne(post_id))
            .group_by(post_tag::Column::PostId)
            .group_by(post::Column::PublishedAt)
            .order_by_desc(Expr::col((PostTagEntity, post_tag::Column::TagId)).count())
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .into_model::<IdRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|r| r.post_id).collect())
    }

    async fn search(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let mut select = PostEntity::find().join(JoinType::InnerJoin, post::Relation::User.def());

        if let Some(q) = search_term(filter.query.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(icontains((PostEntity, post::Column::Title), q))
                    .add(icontains((UserEntity, user::Column::Username), q)),
            );
        }

        if let Some(tag_id) = filter.tag_id {
            select = select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(PostTagEntity)
                        .and_where(post_tag::Column::TagId.eq(tag_id))
                        .to_owned(),
                ),
            );
        }

        let select = within(select, post::Column::PublishedAt, &filter.published)
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Id);

        paged(select, self.db.as_ref(), page).await
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError> {
        tracing::debug!(title, "Finding tag by title");

        let result = TagEntity::find()
            .filter(tag::Column::Title.eq(title))
            .one(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn most_used(&self, limit: u64) -> Result<Vec<(Tag, u64)>, RepoError> {
        let posts = || Expr::col((PostTagEntity, post_tag::Column::PostId)).count();

        let rows = TagEntity::find()
            .select_only()
            .column(tag::Column::Id)
            .column(tag::Column::Title)
            .column_as(posts(), "total")
            .join(JoinType::LeftJoin, tag::Relation::PostTag.def())
            .group_by(tag::Column::Id)
            .order_by_desc(posts())
            .order_by_asc(tag::Column::Title)
            .limit(limit)
            .into_model::<TagCountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    Tag {
                        id: r.id,
                        title: r.title,
                    },
                    to_count(r.total),
                )
            })
            .collect())
    }

    async fn for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .find_also_related(TagEntity)
            .order_by_asc(tag::Column::Title)
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, tag)| tag.map(|t| (link.post_id, t.into())))
            .collect())
    }

    async fn post_counts(&self, tag_ids: &[Uuid]) -> Result<CountMap, RepoError> {
        if tag_ids.is_empty() {
            return Ok(CountMap::new());
        }

        let rows = PostTagEntity::find()
            .select_only()
            .column_as(post_tag::Column::TagId, "id")
            .column_as(
                Expr::col((PostTagEntity, post_tag::Column::PostId)).count(),
                "total",
            )
            .filter(post_tag::Column::TagId.is_in(tag_ids.iter().copied()))
            .group_by(post_tag::Column::TagId)
            .into_model::<CountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(to_count_map(tag_ids, rows))
    }

    async fn search(&self, query: Option<&str>, page: PageRequest) -> Result<Page<Tag>, RepoError> {
        let mut select = TagEntity::find();

        if let Some(q) = search_term(query) {
            select = select.filter(icontains((TagEntity, tag::Column::Title), q));
        }

        paged(select.order_by_asc(tag::Column::Title), self.db.as_ref(), page).await
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::PublishedAt)
            .all(self.db.as_ref())
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search(
        &self,
        filter: &CommentFilter,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let mut select = CommentEntity::find()
            .join(JoinType::InnerJoin, comment::Relation::User.def())
            .join(JoinType::InnerJoin, comment::Relation::Post.def());

        if let Some(q) = search_term(filter.query.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(icontains((UserEntity, user::Column::Username), q))
                    .add(icontains((CommentEntity, comment::Column::Text), q))
                    .add(icontains((PostEntity, post::Column::Title), q)),
            );
        }

        let select = within(select, comment::Column::PublishedAt, &filter.published)
            .order_by_asc(comment::Column::PublishedAt)
            .order_by_asc(comment::Column::Id);

        paged(select, self.db.as_ref(), page).await
    }
}
