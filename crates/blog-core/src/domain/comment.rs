use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Clean, Post, User, require};
use crate::error::DomainError;

/// Comment entity - a reader's remark under a post.
///
/// Comments are deleted together with their post and with their author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub published_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment published now.
    pub fn new(post_id: Uuid, author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text: text.into(),
            published_at: Utc::now(),
        }
    }

    /// Override the publication timestamp.
    pub fn published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Human-readable caption, e.g. `"alice under Hello world"`.
    pub fn caption(&self, author: &User, post: &Post) -> String {
        format!("{} under {}", author.username, post.title)
    }
}

impl Clean for Comment {
    fn clean(&mut self) -> Result<(), DomainError> {
        require("text", &self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption() {
        let author = User::new("alice", "alice@example.com");
        let post = Post::new(
            Uuid::new_v4(),
            "Hello world",
            "First!",
            "hello-world",
            "img.png",
        );
        let comment = Comment::new(post.id, author.id, "Nice");

        assert_eq!(comment.caption(&author, &post), "alice under Hello world");
    }

    #[test]
    fn test_blank_comment_is_rejected() {
        let mut comment = Comment::new(Uuid::new_v4(), Uuid::new_v4(), "");
        assert!(comment.clean().is_err());
    }
}
