use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Clean, max_length, require};
use crate::error::DomainError;
use crate::routes::Route;

pub const POST_TITLE_MAX_LEN: usize = 200;
pub const POST_SLUG_MAX_LEN: usize = 200;

/// Post entity - a published blog article.
///
/// Likes and tags are many-to-many relations stored in their own join
/// tables and managed through [`PostRepository`](crate::ports::PostRepository),
/// independently of the post's own edit lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    /// Storage reference of the cover image.
    pub image: String,
    pub published_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post published now.
    pub fn new(
        author_id: Uuid,
        title: impl Into<String>,
        text: impl Into<String>,
        slug: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: title.into(),
            text: text.into(),
            slug: slug.into(),
            image: image.into(),
            published_at: Utc::now(),
        }
    }

    /// Override the publication timestamp.
    pub fn published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Path of the post detail page.
    pub fn absolute_url(&self) -> String {
        Route::PostDetail { slug: &self.slug }.reverse()
    }
}

impl Clean for Post {
    fn clean(&mut self) -> Result<(), DomainError> {
        require("title", &self.title)?;
        max_length("title", &self.title, POST_TITLE_MAX_LEN)?;
        require("text", &self.text)?;
        require("slug", &self.slug)?;
        max_length("slug", &self.slug, POST_SLUG_MAX_LEN)?;
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::validation(
                "slug",
                "enter a valid slug consisting of letters, numbers, underscores or hyphens",
            ));
        }
        require("image", &self.image)
    }
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
