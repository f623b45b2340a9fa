//! SeaORM entities mirroring the blog schema.

pub mod comment;
pub mod post;
pub mod post_like;
pub mod post_tag;
pub mod tag;
pub mod user;
