//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Expr, OnConflict, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Set,
};
use uuid::Uuid;

use blog_core::domain::{
    Comment, Post, PostWithCommentsCount, PostWithLikesCount, PostWithTags, Tag,
    TagWithPostsCount, User,
};
use blog_core::error::RepoError;
use blog_core::ports::{CommentRepository, PostRepository, TagRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

const LIKES_COUNT: &str = "likes_count";
const COMMENTS_COUNT: &str = "comments_count";
const POSTS_COUNT: &str = "posts_count";

/// Reference to a computed column by its alias, for ORDER BY.
fn annotation(alias: &'static str) -> SimpleExpr {
    Expr::col(Alias::new(alias)).into()
}

/// Post row carrying the `likes_count` annotation.
#[derive(Debug, FromQueryResult)]
struct PostLikesRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    text: String,
    slug: String,
    image: String,
    published_at: sea_orm::prelude::DateTimeWithTimeZone,
    likes_count: i64,
}

impl From<PostLikesRow> for PostWithLikesCount {
    fn from(row: PostLikesRow) -> Self {
        Self {
            post: post::Model {
                id: row.id,
                author_id: row.author_id,
                title: row.title,
                text: row.text,
                slug: row.slug,
                image: row.image,
                published_at: row.published_at,
            }
            .into(),
            likes_count: row.likes_count,
        }
    }
}

/// Post row carrying the `comments_count` annotation.
#[derive(Debug, FromQueryResult)]
struct PostCommentsRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    text: String,
    slug: String,
    image: String,
    published_at: sea_orm::prelude::DateTimeWithTimeZone,
    comments_count: i64,
}

impl From<PostCommentsRow> for PostWithCommentsCount {
    fn from(row: PostCommentsRow) -> Self {
        Self {
            post: post::Model {
                id: row.id,
                author_id: row.author_id,
                title: row.title,
                text: row.text,
                slug: row.slug,
                image: row.image,
                published_at: row.published_at,
            }
            .into(),
            comments_count: row.comments_count,
        }
    }
}

/// Tag row carrying the `posts_count` annotation.
#[derive(Debug, FromQueryResult)]
struct TagPostsRow {
    id: Uuid,
    title: String,
    posts_count: i64,
}

impl From<TagPostsRow> for TagWithPostsCount {
    fn from(row: TagPostsRow) -> Self {
        Self {
            tag: Tag {
                id: row.id,
                title: row.title,
            },
            posts_count: row.posts_count,
        }
    }
}

/// Posts annotated with their comment count, newest first.
fn posts_with_comments_count() -> Select<PostEntity> {
    PostEntity::find()
        .column_as(
            Expr::col((CommentEntity, comment::Column::Id)).count(),
            COMMENTS_COUNT,
        )
        .join(JoinType::LeftJoin, post::Relation::Comments.def())
        .group_by(post::Column::Id)
        .order_by_desc(post::Column::PublishedAt)
        .order_by_asc(post::Column::Id)
}

/// Tags annotated with their post count, most used first.
fn popular_tags() -> Select<TagEntity> {
    TagEntity::find()
        .column_as(
            Expr::col((PostTagEntity, post_tag::Column::PostId)).count(),
            POSTS_COUNT,
        )
        .join(JoinType::LeftJoin, tag::Relation::PostTags.def())
        .group_by(tag::Column::Id)
        .order_by_desc(annotation(POSTS_COUNT))
        .order_by_asc(tag::Column::Title)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn staff(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::IsStaff.eq(true))
            .order_by_asc(user::Column::Username)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Id)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .order_by_desc(post::Column::PublishedAt)
            .one(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::PublishedAt)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn popular(&self) -> Result<Vec<PostWithLikesCount>, RepoError> {
        tracing::debug!("Listing posts by like count");

        let rows = PostEntity::find()
            .column_as(
                Expr::col((PostLikeEntity, post_like::Column::UserId)).count(),
                LIKES_COUNT,
            )
            .join(JoinType::LeftJoin, post::Relation::Likes.def())
            .group_by(post::Column::Id)
            .order_by_desc(annotation(LIKES_COUNT))
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Id)
            .into_model::<PostLikesRow>()
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fetch_with_comments_count(
        &self,
        selection: &[Uuid],
    ) -> Result<Vec<PostWithCommentsCount>, RepoError> {
        tracing::debug!(selected = selection.len(), "Counting comments for selection");

        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let rows = posts_with_comments_count()
            .filter(post::Column::Id.is_in(selection.iter().copied()))
            .into_model::<PostCommentsRow>()
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fresh_posts(&self) -> Result<Vec<PostWithCommentsCount>, RepoError> {
        tracing::debug!("Listing fresh posts");

        let rows = posts_with_comments_count()
            .into_model::<PostCommentsRow>()
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fetch_with_tags(&self, selection: &[Uuid]) -> Result<Vec<PostWithTags>, RepoError> {
        let posts = self.fetch_with_comments_count(selection).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.post.id).collect();
        tracing::debug!(posts = ids.len(), "Prefetching tags");

        let links = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(ids.clone()))
            .all(self.conn());

        let tags = popular_tags()
            .filter(
                tag::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::TagId)
                        .from(PostTagEntity)
                        .and_where(post_tag::Column::PostId.is_in(ids))
                        .to_owned(),
                ),
            )
            .into_model::<TagPostsRow>()
            .all(self.conn());

        let (links, tags) = futures::try_join!(links, tags).map_err(repo_error)?;

        let tags: Vec<TagWithPostsCount> = tags.into_iter().map(Into::into).collect();
        Ok(PostWithTags::assemble(
            posts,
            links.into_iter().map(|link| (link.post_id, link.tag_id)),
            &tags,
        ))
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let like = post_like::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
        };

        PostLikeEntity::insert(like)
            .on_conflict(
                OnConflict::columns([post_like::Column::PostId, post_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(())
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        PostLikeEntity::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .exec(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(())
    }

    async fn likers(&self, post_id: Uuid) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .join(JoinType::InnerJoin, user::Relation::Likes.def())
            .filter(post_like::Column::PostId.eq(post_id))
            .order_by_asc(user::Column::Username)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn liked_by(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::Likes.def())
            .filter(post_like::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::PublishedAt)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn add_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let link = post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(tag_id),
        };

        PostTagEntity::insert(link)
            .on_conflict(
                OnConflict::columns([post_tag::Column::PostId, post_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(())
    }

    async fn remove_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .filter(post_tag::Column::TagId.eq(tag_id))
            .exec(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(())
    }

    async fn tags(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .join(JoinType::InnerJoin, tag::Relation::PostTags.def())
            .filter(post_tag::Column::PostId.eq(post_id))
            .order_by_asc(tag::Column::Title)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn list(&self) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .order_by_asc(tag::Column::Title)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Title.eq(Tag::normalize_title(title)))
            .one(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn popular(&self) -> Result<Vec<TagWithPostsCount>, RepoError> {
        tracing::debug!("Listing tags by post count");

        let rows = popular_tags()
            .into_model::<TagPostsRow>()
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn posts(&self, tag_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::PostTags.def())
            .filter(post_tag::Column::TagId.eq(tag_id))
            .order_by_desc(post::Column::PublishedAt)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::PublishedAt)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::AuthorId.eq(author_id))
            .order_by_asc(comment::Column::PublishedAt)
            .all(self.conn())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
