//! In-memory repositories - used when no database is configured.
//!
//! All four repositories share one set of tables behind an async `RwLock`,
//! and emulate the schema's unique and foreign-key constraints together
//! with its cascading deletes.
//! Note: Data is lost on process restart.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{
    Clean, Comment, Post, PostWithCommentsCount, PostWithLikesCount, PostWithTags, Tag,
    TagWithPostsCount, User,
};
use blog_core::error::{DomainError, RepoError};
use blog_core::ports::{
    BaseRepository, CommentRepository, PostRepository, TagRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    comments: HashMap<Uuid, Comment>,
    /// `(post_id, user_id)`
    likes: BTreeSet<(Uuid, Uuid)>,
    /// `(post_id, tag_id)`
    post_tags: BTreeSet<(Uuid, Uuid)>,
}

impl Tables {
    fn delete_user(&mut self, id: Uuid) -> bool {
        if self.users.remove(&id).is_none() {
            return false;
        }
        let authored: Vec<Uuid> = self
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            self.delete_post(post_id);
        }
        self.comments.retain(|_, c| c.author_id != id);
        self.likes.retain(|&(_, user_id)| user_id != id);
        true
    }

    fn delete_post(&mut self, id: Uuid) -> bool {
        if self.posts.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.retain(|&(post_id, _)| post_id != id);
        self.post_tags.retain(|&(post_id, _)| post_id != id);
        true
    }

    fn delete_tag(&mut self, id: Uuid) -> bool {
        if self.tags.remove(&id).is_none() {
            return false;
        }
        self.post_tags.retain(|&(_, tag_id)| tag_id != id);
        true
    }

    fn likes_count(&self, post_id: Uuid) -> i64 {
        self.likes.iter().filter(|&&(p, _)| p == post_id).count() as i64
    }

    fn comments_count(&self, post_id: Uuid) -> i64 {
        self.comments.values().filter(|c| c.post_id == post_id).count() as i64
    }

    fn posts_count(&self, tag_id: Uuid) -> i64 {
        self.post_tags.iter().filter(|&&(_, t)| t == tag_id).count() as i64
    }

    fn popular_tags(&self) -> Vec<TagWithPostsCount> {
        let mut tags: Vec<TagWithPostsCount> = self
            .tags
            .values()
            .map(|tag| TagWithPostsCount {
                posts_count: self.posts_count(tag.id),
                tag: tag.clone(),
            })
            .collect();
        tags.sort_by(|a, b| {
            b.posts_count
                .cmp(&a.posts_count)
                .then_with(|| a.tag.title.cmp(&b.tag.title))
        });
        tags
    }

    /// Posts named by `selection` with their comment counts, newest first.
    /// Unknown and repeated ids are skipped.
    fn posts_with_comments_count(&self, selection: &[Uuid]) -> Vec<PostWithCommentsCount> {
        let mut seen = HashSet::new();
        let mut posts: Vec<Post> = selection
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.posts.get(id).cloned())
            .collect();
        newest_first(&mut posts);

        posts
            .into_iter()
            .map(|post| PostWithCommentsCount {
                comments_count: self.comments_count(post.id),
                post,
            })
            .collect()
    }

    fn require_post(&self, post_id: Uuid) -> Result<(), RepoError> {
        if !self.posts.contains_key(&post_id) {
            return Err(RepoError::Constraint(format!("post {post_id} does not exist")));
        }
        Ok(())
    }

    fn require_user(&self, user_id: Uuid) -> Result<(), RepoError> {
        if !self.users.contains_key(&user_id) {
            return Err(RepoError::Constraint(format!("user {user_id} does not exist")));
        }
        Ok(())
    }

    fn require_tag(&self, tag_id: Uuid) -> Result<(), RepoError> {
        if !self.tags.contains_key(&tag_id) {
            return Err(RepoError::Constraint(format!("tag {tag_id} does not exist")));
        }
        Ok(())
    }
}

/// Default post ordering: newest first.
fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Default comment ordering: oldest first.
fn oldest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        a.published_at
            .cmp(&b.published_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Shared in-memory tables. Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            store: self.clone(),
        }
    }

    pub fn tags(&self) -> InMemoryTagRepository {
        InMemoryTagRepository {
            store: self.clone(),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            store: self.clone(),
        }
    }
}

pub struct InMemoryUserRepository {
    store: InMemoryStore,
}

pub struct InMemoryPostRepository {
    store: InMemoryStore,
}

pub struct InMemoryTagRepository {
    store: InMemoryStore,
}

pub struct InMemoryCommentRepository {
    store: InMemoryStore,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        user.clean()?;

        let mut tables = self.store.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(DomainError::Duplicate(format!(
                "username '{}' is already taken",
                user.username
            ))
            .into());
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.delete_user(id) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn staff(&self) -> Result<Vec<User>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut staff: Vec<User> = tables.users.values().filter(|u| u.is_staff).cloned().collect();
        staff.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(staff)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        post.clean()?;

        let mut tables = self.store.tables.write().await;
        tables.require_user(post.author_id)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.delete_post(id) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables.posts.values().cloned().collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let mut posts = self.list().await?;
        posts.retain(|p| p.slug == slug);
        Ok(posts.into_iter().next())
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.list().await?;
        posts.retain(|p| p.author_id == author_id);
        Ok(posts)
    }

    async fn popular(&self) -> Result<Vec<PostWithLikesCount>, RepoError> {
        tracing::debug!("Listing posts by like count");

        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables.posts.values().cloned().collect();
        newest_first(&mut posts);

        let mut counted: Vec<PostWithLikesCount> = posts
            .into_iter()
            .map(|post| PostWithLikesCount {
                likes_count: tables.likes_count(post.id),
                post,
            })
            .collect();
        // Stable sort keeps newest first among equal counts.
        counted.sort_by(|a, b| b.likes_count.cmp(&a.likes_count));
        Ok(counted)
    }

    async fn fetch_with_comments_count(
        &self,
        selection: &[Uuid],
    ) -> Result<Vec<PostWithCommentsCount>, RepoError> {
        tracing::debug!(selected = selection.len(), "Counting comments for selection");

        let tables = self.store.tables.read().await;
        Ok(tables.posts_with_comments_count(selection))
    }

    async fn fresh_posts(&self) -> Result<Vec<PostWithCommentsCount>, RepoError> {
        tracing::debug!("Listing fresh posts");

        let ids: Vec<Uuid> = self.list().await?.iter().map(|p| p.id).collect();
        self.fetch_with_comments_count(&ids).await
    }

    async fn fetch_with_tags(&self, selection: &[Uuid]) -> Result<Vec<PostWithTags>, RepoError> {
        tracing::debug!(selected = selection.len(), "Listing posts with tags");

        // Counts and tags come from the same snapshot.
        let tables = self.store.tables.read().await;
        let posts = tables.posts_with_comments_count(selection);
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: HashSet<Uuid> = posts.iter().map(|p| p.post.id).collect();
        let links: Vec<(Uuid, Uuid)> = tables
            .post_tags
            .iter()
            .filter(|(post_id, _)| ids.contains(post_id))
            .copied()
            .collect();
        let popular = tables.popular_tags();

        Ok(PostWithTags::assemble(posts, links, &popular))
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.require_post(post_id)?;
        tables.require_user(user_id)?;
        tables.likes.insert((post_id, user_id));
        Ok(())
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.likes.remove(&(post_id, user_id));
        Ok(())
    }

    async fn likers(&self, post_id: Uuid) -> Result<Vec<User>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut users: Vec<User> = tables
            .likes
            .iter()
            .filter(|&&(p, _)| p == post_id)
            .filter_map(|(_, user_id)| tables.users.get(user_id).cloned())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn liked_by(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .likes
            .iter()
            .filter(|&&(_, u)| u == user_id)
            .filter_map(|(post_id, _)| tables.posts.get(post_id).cloned())
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn add_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.require_post(post_id)?;
        tables.require_tag(tag_id)?;
        tables.post_tags.insert((post_id, tag_id));
        Ok(())
    }

    async fn remove_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.post_tags.remove(&(post_id, tag_id));
        Ok(())
    }

    async fn tags(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut tags: Vec<Tag> = tables
            .post_tags
            .iter()
            .filter(|&&(p, _)| p == post_id)
            .filter_map(|(_, tag_id)| tables.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tags)
    }
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryTagRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.tags.get(&id).cloned())
    }

    async fn save(&self, mut tag: Tag) -> Result<Tag, RepoError> {
        tag.clean()?;

        let mut tables = self.store.tables.write().await;
        if tables
            .tags
            .values()
            .any(|t| t.id != tag.id && t.title == tag.title)
        {
            return Err(
                DomainError::Duplicate(format!("tag '{}' already exists", tag.title)).into(),
            );
        }

        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.delete_tag(id) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn list(&self) -> Result<Vec<Tag>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut tags: Vec<Tag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tags)
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Tag>, RepoError> {
        let title = Tag::normalize_title(title);
        let tables = self.store.tables.read().await;
        Ok(tables.tags.values().find(|t| t.title == title).cloned())
    }

    async fn popular(&self) -> Result<Vec<TagWithPostsCount>, RepoError> {
        tracing::debug!("Listing tags by post count");

        let tables = self.store.tables.read().await;
        Ok(tables.popular_tags())
    }

    async fn posts(&self, tag_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .post_tags
            .iter()
            .filter(|&&(_, t)| t == tag_id)
            .filter_map(|(post_id, _)| tables.posts.get(post_id).cloned())
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn save(&self, mut comment: Comment) -> Result<Comment, RepoError> {
        comment.clean()?;

        let mut tables = self.store.tables.write().await;
        tables.require_post(comment.post_id)?;
        tables.require_user(comment.author_id)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.comments.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        oldest_first(&mut comments);
        Ok(comments)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.author_id == author_id)
            .cloned()
            .collect();
        oldest_first(&mut comments);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests;
