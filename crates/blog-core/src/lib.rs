//! # Blog Core
//!
//! The domain layer of the blog persistence layer.
//! This crate contains the entities, their validation rules, the listing
//! views produced by the query helpers, and the repository ports that
//! storage backends implement. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod routes;

pub use error::{DomainError, RepoError};
