//! # Blog Infrastructure
//!
//! Concrete implementations of the repository ports defined in `blog-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store only
//! - `postgres` - PostgreSQL storage via SeaORM

pub mod database;
pub mod memory;
pub mod repositories;

// Re-exports
pub use database::DatabaseConfig;
pub use memory::InMemoryStore;
pub use repositories::Repositories;
