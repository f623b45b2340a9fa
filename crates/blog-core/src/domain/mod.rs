//! Domain entities - the core business objects.

mod comment;
mod listing;
mod post;
mod tag;
mod user;

pub use comment::Comment;
pub use listing::{PostWithCommentsCount, PostWithLikesCount, PostWithTags, TagWithPostsCount};
pub use post::{Post, POST_SLUG_MAX_LEN, POST_TITLE_MAX_LEN};
pub use tag::{Tag, TAG_TITLE_MAX_LEN};
pub use user::User;

use crate::error::DomainError;

/// Field normalization and validation run before every write.
///
/// Implementations may rewrite fields into their canonical form (tag titles
/// are lower-cased) before checking them.
pub trait Clean {
    fn clean(&mut self) -> Result<(), DomainError>;
}

/// Reject empty or whitespace-only values for a required field.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "this field cannot be blank"));
    }
    Ok(())
}

/// Enforce a maximum length counted in characters, not bytes.
pub(crate) fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(
            field,
            format!("ensure this value has at most {max} characters (it has {len})"),
        ));
    }
    Ok(())
}
