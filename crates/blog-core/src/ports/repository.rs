use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, Post, PostWithCommentsCount, PostWithLikesCount, PostWithTags, Tag,
    TagWithPostsCount, User,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Clean and save an entity (create or update).
    ///
    /// Returns the entity as stored, after normalization.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to dependent rows.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Users belong to the host authentication system; this
/// crate only reads them and keeps a mirror for referential integrity.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Accounts allowed to author posts, ordered by username.
    async fn staff(&self) -> Result<Vec<User>, RepoError>;
}

/// Post repository with the annotated listing helpers.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Posts written by one author, newest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// All posts annotated with their like count, most liked first.
    ///
    /// Posts with equal counts fall back to newest first.
    async fn popular(&self) -> Result<Vec<PostWithLikesCount>, RepoError>;

    /// The selected posts annotated with their comment count, newest first.
    ///
    /// The count runs as its own aggregation restricted to `selection`, so a
    /// small page never pays for counting comments across the whole table.
    /// Unknown and repeated ids are ignored.
    async fn fetch_with_comments_count(
        &self,
        selection: &[Uuid],
    ) -> Result<Vec<PostWithCommentsCount>, RepoError>;

    /// All posts annotated with their comment count, newest first.
    async fn fresh_posts(&self) -> Result<Vec<PostWithCommentsCount>, RepoError>;

    /// [`fetch_with_comments_count`](Self::fetch_with_comments_count) plus
    /// each post's tags, most popular tag first. Tags for the whole
    /// selection are loaded at once rather than per post.
    async fn fetch_with_tags(&self, selection: &[Uuid]) -> Result<Vec<PostWithTags>, RepoError>;

    /// Record that `user_id` likes `post_id`. Liking twice is a no-op.
    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError>;

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError>;

    /// Users who liked a post, ordered by username.
    async fn likers(&self, post_id: Uuid) -> Result<Vec<User>, RepoError>;

    /// Posts a user liked, newest first.
    async fn liked_by(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Attach a tag to a post. Attaching twice is a no-op.
    async fn add_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError>;

    async fn remove_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError>;

    /// Tags of a post, alphabetical.
    async fn tags(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    /// All tags, alphabetical.
    async fn list(&self) -> Result<Vec<Tag>, RepoError>;

    /// Look a tag up by title; the title is normalized first.
    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError>;

    /// All tags annotated with their post count, most used first.
    ///
    /// Tags with equal counts fall back to alphabetical order.
    async fn popular(&self) -> Result<Vec<TagWithPostsCount>, RepoError>;

    /// Posts carrying a tag, newest first.
    async fn posts(&self, tag_id: Uuid) -> Result<Vec<Post>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments under a post, oldest first.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// Comments written by a user, oldest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}
