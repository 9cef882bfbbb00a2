//! # sitehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `sitehub-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Render list queries (filters, sort, relations) as SQL
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `sitehub-app` (for port traits) and `sitehub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod group_repo;
pub mod pool;
mod query;
pub mod site_repo;

pub use error::StorageError;
pub use group_repo::SqliteGroupRepository;
pub use pool::{Config, Database};
pub use site_repo::SqliteSiteRepository;
