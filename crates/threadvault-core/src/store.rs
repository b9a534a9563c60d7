//! The `ThreadStore` trait — the seam between storage backends and
//! everything that consumes archived data.
//!
//! All writes are idempotent upserts keyed by natural id: re-ingesting the
//! same records is always safe, and callers own retry policy (nothing is
//! retried internally). Batch variants execute as one all-or-nothing
//! transaction.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes.

use std::future::Future;

use crate::{
  comment::{Comment, NewComment},
  post::{NewPost, Post},
  query::{PostQuery, PostStats},
  subreddit::{NewSubreddit, Subreddit},
};

/// Abstraction over a ThreadVault storage backend.
pub trait ThreadStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subreddits ────────────────────────────────────────────────────────

  /// Insert or update a subreddit by name. Metadata and the raw payload
  /// are refreshed; the sync timestamp advances.
  fn save_subreddit(
    &self,
    sub: NewSubreddit,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert many subreddits in one transaction.
  fn save_subreddits(
    &self,
    subs: Vec<NewSubreddit>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fetch a subreddit by name. Errors if no such row exists.
  fn get_subreddit<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Subreddit, Self::Error>> + Send + 'a;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Insert or update a post by id, implicitly creating its subreddit if
  /// it has never been seen.
  fn save_post(
    &self,
    post: NewPost,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert many posts in one transaction. Referenced subreddits are
  /// deduplicated and ensured once each.
  fn save_posts(
    &self,
    posts: Vec<NewPost>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fetch a post by id. Errors if no such row exists.
  fn get_post<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + 'a;

  /// List posts in a subreddit with pagination, sorting, and an optional
  /// creation-time range.
  fn posts_in_subreddit<'a>(
    &'a self,
    subreddit: &'a str,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  /// Substring search over post titles and bodies, highest score first.
  fn search_posts<'a>(
    &'a self,
    text: &'a str,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  /// Aggregate thread statistics for a post. Errors if the post does not
  /// exist.
  fn post_stats<'a>(
    &'a self,
    post_id: &'a str,
  ) -> impl Future<Output = Result<PostStats, Self::Error>> + Send + 'a;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Insert or update a comment by id. The owning post must already exist.
  /// Depth is resolved from the parent chain at save time.
  fn save_comment(
    &self,
    comment: NewComment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert many comments in one transaction. Parents may live in the same
  /// batch, in prior storage, or nowhere (orphans become roots); depths are
  /// resolved across the whole batch before any row is written.
  fn save_comments(
    &self,
    comments: Vec<NewComment>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fetch a comment by id. Errors if no such row exists.
  fn get_comment<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + 'a;

  /// Return every comment on a post as a flattened tree: each comment
  /// appears after its parent and before its own descendants, and siblings
  /// are ordered by ascending creation time. A post with no comments yields
  /// an empty vec.
  fn get_thread<'a>(
    &'a self,
    post_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;
}
