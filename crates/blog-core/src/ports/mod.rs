//! Ports - trait definitions for the storage backends.
//! These are the interfaces the infrastructure crate implements.

mod repository;

pub use repository::{
    BaseRepository, CommentRepository, PostRepository, TagRepository, UserRepository,
};
