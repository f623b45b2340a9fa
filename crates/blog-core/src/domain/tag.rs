use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Clean, max_length, require};
use crate::error::DomainError;
use crate::routes::Route;

pub const TAG_TITLE_MAX_LEN: usize = 20;

/// Tag entity - a unique, lower-case label attached to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
}

impl Tag {
    /// Create a new tag. The title is stored as given until [`Clean::clean`]
    /// runs; every repository write path runs it.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }

    /// Canonical stored form of a tag title.
    pub fn normalize_title(title: &str) -> String {
        title.to_lowercase()
    }

    /// Path of the page listing posts carrying this tag.
    pub fn absolute_url(&self) -> String {
        Route::TagFilter {
            tag_title: &self.title,
        }
        .reverse()
    }
}

impl Clean for Tag {
    fn clean(&mut self) -> Result<(), DomainError> {
        self.title = Self::normalize_title(&self.title);
        require("title", &self.title)?;
        max_length("title", &self.title, TAG_TITLE_MAX_LEN)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lower_cases_title() {
        let mut tag = Tag::new("Django");
        tag.clean().unwrap();
        assert_eq!(tag.title, "django");
    }

    #[test]
    fn test_distinct_cases_collapse_to_one_form() {
        let mut upper = Tag::new("PYTHON");
        let mut mixed = Tag::new("Python");
        upper.clean().unwrap();
        mixed.clean().unwrap();
        assert_eq!(upper.title, mixed.title);
    }

    #[test]
    fn test_clean_handles_non_ascii() {
        let mut tag = Tag::new("Ржавчина");
        tag.clean().unwrap();
        assert_eq!(tag.title, "ржавчина");
    }

    #[test]
    fn test_title_limits() {
        let mut empty = Tag::new("");
        assert!(empty.clean().is_err());

        let mut long = Tag::new("a".repeat(TAG_TITLE_MAX_LEN + 1));
        let err = long.clean().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "title", .. }));
    }

    #[test]
    fn test_absolute_url_uses_title() {
        let mut tag = Tag::new("Rust");
        tag.clean().unwrap();
        assert_eq!(tag.absolute_url(), "/tag/rust/");
    }
}
