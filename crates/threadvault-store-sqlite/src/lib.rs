//! SQLite backend for the ThreadVault archive store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Schema evolution goes through
//! a versioned migration runner; see [`migrations`].

mod comments;
mod depth;
mod encode;
mod posts;
mod store;
mod subreddits;

pub mod error;
pub mod migrations;

pub use error::{Error, Result};
pub use migrations::{Migration, MigrationRunner, MIGRATIONS};
pub use store::SqliteStore;
