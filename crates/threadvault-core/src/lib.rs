//! Core types and trait definitions for the ThreadVault archive store.
//!
//! This crate is deliberately free of database dependencies. Storage
//! backends implement [`store::ThreadStore`]; everything above the store
//! depends on this abstraction, not on any concrete backend.

pub mod comment;
pub mod post;
pub mod query;
pub mod store;
pub mod subreddit;

pub use comment::{Comment, NewComment};
pub use post::{NewPost, Post};
pub use query::{PostQuery, PostStats, SortField, SortOrder};
pub use store::ThreadStore;
pub use subreddit::{NewSubreddit, Subreddit};
