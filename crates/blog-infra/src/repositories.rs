//! Repository bundle - one handle per port, backed by a single store.

use std::sync::Arc;

use blog_core::error::RepoError;
use blog_core::ports::{CommentRepository, PostRepository, TagRepository, UserRepository};

use crate::database::DatabaseConfig;
use crate::memory::InMemoryStore;

#[cfg(feature = "postgres")]
use crate::database::{
    PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository,
};

/// The four blog repositories, sharing one backing store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Repositories over a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            tags: Arc::new(store.tags()),
            comments: Arc::new(store.comments()),
        }
    }

    /// Repositories over an open SeaORM connection pool.
    #[cfg(feature = "postgres")]
    pub fn postgres(db: sea_orm::DbConn) -> Self {
        let db = Arc::new(db);
        Self {
            users: Arc::new(PostgresUserRepository::shared(Arc::clone(&db))),
            posts: Arc::new(PostgresPostRepository::shared(Arc::clone(&db))),
            tags: Arc::new(PostgresTagRepository::shared(Arc::clone(&db))),
            comments: Arc::new(PostgresCommentRepository::shared(db)),
        }
    }

    /// Build the repositories appropriate for `config`.
    ///
    /// Without a database configuration the in-memory store is used. A
    /// configured database that cannot be reached is an error, never a
    /// silent fallback.
    pub async fn from_config(config: Option<&DatabaseConfig>) -> Result<Self, RepoError> {
        let Some(config) = config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Ok(Self::in_memory());
        };

        Self::open(config).await
    }

    #[cfg(feature = "postgres")]
    async fn open(config: &DatabaseConfig) -> Result<Self, RepoError> {
        let db = crate::database::connect(config)
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;
        tracing::info!("Repositories initialized");
        Ok(Self::postgres(db))
    }

    #[cfg(not(feature = "postgres"))]
    async fn open(_config: &DatabaseConfig) -> Result<Self, RepoError> {
        tracing::warn!("Built without postgres feature - using in-memory repositories");
        Ok(Self::in_memory())
    }
}

#[cfg(test)]
mod tests {
    use blog_core::domain::{Comment, Post, Tag, User};

    use super::*;

    #[tokio::test]
    async fn test_without_config_uses_in_memory_store() {
        let repos = Repositories::from_config(None).await.unwrap();

        let author = repos
            .users
            .save(User::staff("editor", "editor@example.com"))
            .await
            .unwrap();
        let post = repos
            .posts
            .save(Post::new(author.id, "Hello", "World", "hello", "hello.png"))
            .await
            .unwrap();
        let tag = repos.tags.save(Tag::new("Greetings")).await.unwrap();
        repos.posts.add_tag(post.id, tag.id).await.unwrap();
        for text in ["one", "two", "three"] {
            repos
                .comments
                .save(Comment::new(post.id, author.id, text))
                .await
                .unwrap();
        }

        let fresh = repos.posts.fresh_posts().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].comments_count, 3);

        let popular = repos.posts.popular().await.unwrap();
        assert_eq!(popular[0].likes_count, 0);

        let listed = repos.posts.fetch_with_tags(&[post.id]).await.unwrap();
        assert_eq!(listed[0].tags[0].tag.title, "greetings");
        assert_eq!(listed[0].tags[0].tag.absolute_url(), "/tag/greetings/");
    }
}
