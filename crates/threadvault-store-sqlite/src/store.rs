//! [`SqliteStore`] — the SQLite implementation of [`ThreadStore`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use threadvault_core::{
  Comment, NewComment, NewPost, NewSubreddit, Post, PostQuery, PostStats, Subreddit, ThreadStore,
};

use crate::{
  comments, encode::encode_dt, migrations::{MigrationRunner, MIGRATIONS}, posts, subreddits,
  Error, Result,
};

/// Per-connection settings; WAL cannot be switched inside a transaction, so
/// this runs before the migration runner.
const CONN_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A thread archive backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// operations run on the connection's dedicated thread; dropping an
/// operation's future only abandons its result — a closure already
/// dispatched to that thread still runs to completion, so a batch either
/// commits whole or not at all, but cancellation does not undo it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring the schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Connection)?;
    Self::attach(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Connection)?;
    Self::attach(conn).await
  }

  async fn attach(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(CONN_PRAGMAS)?;
        Ok(())
      })
      .await
      .map_err(Error::Connection)?;

    let store = Self { conn };
    store.run_migrations().await?;
    tracing::debug!("sqlite store attached");
    Ok(store)
  }

  /// Apply pending schema migrations. Already runs as part of `open`;
  /// repeated calls are a no-op. Returns the number applied.
  pub async fn run_migrations(&self) -> Result<u32> {
    MigrationRunner::new(MIGRATIONS)?.apply(&self.conn).await
  }

  /// The highest schema version recorded in the migration ledger.
  pub async fn schema_version(&self) -> Result<i64> {
    MigrationRunner::new(MIGRATIONS)?.current_version(&self.conn).await
  }

  /// Release the underlying connection.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await.map_err(Error::Connection)
  }

  /// Run `f` on the connection's thread, labelling transport-level failures
  /// with `op`. Domain errors pass through untouched.
  async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(f(conn)))
      .await
      .map_err(|source| Error::Database { op, source })?
  }

  /// Like [`Self::call`], but wraps `f` in a transaction: every batch is
  /// all-or-nothing, and a dropped future or failing entity rolls the whole
  /// thing back.
  async fn call_tx<T, F>(&self, op: &'static str, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .call(op, move |conn| {
        let tx = conn.transaction().map_err(|e| Error::db(op, e))?;
        let out = f(&tx)?;
        tx.commit().map_err(|e| Error::db(op, e))?;
        Ok(out)
      })
      .await
  }
}

// ─── ThreadStore impl ────────────────────────────────────────────────────────

impl ThreadStore for SqliteStore {
  type Error = Error;

  // ── Subreddits ────────────────────────────────────────────────────────────

  async fn save_subreddit(&self, sub: NewSubreddit) -> Result<()> {
    let now = encode_dt(Utc::now());
    self
      .call("save_subreddit", move |conn| subreddits::upsert(conn, &sub, &now))
      .await
  }

  async fn save_subreddits(&self, subs: Vec<NewSubreddit>) -> Result<()> {
    if subs.is_empty() {
      return Ok(());
    }
    let now = encode_dt(Utc::now());
    self
      .call_tx("save_subreddits", move |tx| {
        for sub in &subs {
          subreddits::upsert(tx, sub, &now)?;
        }
        Ok(())
      })
      .await
  }

  async fn get_subreddit(&self, name: &str) -> Result<Subreddit> {
    let name = name.to_owned();
    self
      .call("get_subreddit", move |conn| subreddits::get(conn, &name))
      .await
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn save_post(&self, post: NewPost) -> Result<()> {
    let now = encode_dt(Utc::now());
    self
      .call_tx("save_post", move |tx| {
        subreddits::ensure(tx, &post.subreddit, &now)?;
        posts::upsert(tx, &post, &now)
      })
      .await
  }

  async fn save_posts(&self, batch: Vec<NewPost>) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    let now = encode_dt(Utc::now());
    self
      .call_tx("save_posts", move |tx| {
        // Ensure each referenced subreddit once, not once per post.
        let mut seen = HashSet::new();
        for post in &batch {
          if seen.insert(post.subreddit.as_str()) {
            subreddits::ensure(tx, &post.subreddit, &now)?;
          }
        }
        for post in &batch {
          posts::upsert(tx, post, &now)?;
        }
        Ok(())
      })
      .await
  }

  async fn get_post(&self, id: &str) -> Result<Post> {
    let id = id.to_owned();
    self.call("get_post", move |conn| posts::get(conn, &id)).await
  }

  async fn posts_in_subreddit(&self, subreddit: &str, query: &PostQuery) -> Result<Vec<Post>> {
    let subreddit = subreddit.to_owned();
    let query = query.clone();
    self
      .call("posts_in_subreddit", move |conn| {
        posts::in_subreddit(conn, &subreddit, &query)
      })
      .await
  }

  async fn search_posts(&self, text: &str, query: &PostQuery) -> Result<Vec<Post>> {
    let text = text.to_owned();
    let query = query.clone();
    self
      .call("search_posts", move |conn| posts::search(conn, &text, &query))
      .await
  }

  async fn post_stats(&self, post_id: &str) -> Result<PostStats> {
    let post_id = post_id.to_owned();
    self.call("post_stats", move |conn| posts::stats(conn, &post_id)).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn save_comment(&self, comment: NewComment) -> Result<()> {
    let now = encode_dt(Utc::now());
    self
      .call_tx("save_comment", move |tx| {
        comments::upsert_many(tx, "save_comment", std::slice::from_ref(&comment), &now)
      })
      .await
  }

  async fn save_comments(&self, batch: Vec<NewComment>) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    let now = encode_dt(Utc::now());
    self
      .call_tx("save_comments", move |tx| {
        comments::upsert_many(tx, "save_comments", &batch, &now)
      })
      .await
  }

  async fn get_comment(&self, id: &str) -> Result<Comment> {
    let id = id.to_owned();
    self.call("get_comment", move |conn| comments::get(conn, &id)).await
  }

  async fn get_thread(&self, post_id: &str) -> Result<Vec<Comment>> {
    let post_id = post_id.to_owned();
    self
      .call("get_thread", move |conn| comments::thread(conn, &post_id))
      .await
  }
}
