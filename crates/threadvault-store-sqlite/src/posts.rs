//! SQL for the `posts` table, including the subreddit-scoped listing query.

use rusqlite::{Connection, OptionalExtension as _};
use threadvault_core::{NewPost, Post, PostQuery, PostStats, SortField, SortOrder};

use crate::{
  encode::{encode_dt, encode_raw, RawPost},
  Error, Result,
};

/// Applied when a query does not set its own limit.
const DEFAULT_LIMIT: usize = 25;

const POST_COLUMNS: &str = "id, subreddit, author, title, selftext, url, score, num_comments, \
   created_utc, edited_utc, is_self, is_video, raw_json, archived_at, last_updated";

/// Insert a post or refresh its mutable fields. `archived_at` is written on
/// first insert only; the natural key and creation time never change.
pub(crate) fn upsert(conn: &Connection, post: &NewPost, now: &str) -> Result<()> {
  let raw = encode_raw("save_post", &post.raw)?;

  conn
    .execute(
      "INSERT INTO posts (
         id, subreddit, author, title, selftext, url, score, num_comments,
         created_utc, edited_utc, is_self, is_video, raw_json, archived_at, last_updated
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
       ON CONFLICT (id) DO UPDATE SET
         score        = excluded.score,
         num_comments = excluded.num_comments,
         edited_utc   = excluded.edited_utc,
         last_updated = excluded.last_updated,
         raw_json     = excluded.raw_json",
      rusqlite::params![
        post.id,
        post.subreddit,
        post.author,
        post.title,
        post.selftext,
        post.url,
        post.score,
        post.num_comments,
        encode_dt(post.created_at),
        post.edited_at.map(encode_dt),
        post.is_self,
        post.is_video,
        raw,
        now,
        now,
      ],
    )
    .map_err(|e| Error::db("save_post", e))?;

  Ok(())
}

pub(crate) fn exists(conn: &Connection, id: &str) -> Result<bool> {
  conn
    .query_row("SELECT 1 FROM posts WHERE id = ?1", rusqlite::params![id], |_| Ok(true))
    .optional()
    .map(|found| found.unwrap_or(false))
    .map_err(|e| Error::db("post_exists", e))
}

pub(crate) fn get(conn: &Connection, id: &str) -> Result<Post> {
  let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
  let raw = conn
    .query_row(&sql, rusqlite::params![id], scan_post)
    .optional()
    .map_err(|e| Error::db("get_post", e))?;

  match raw {
    Some(raw) => raw.into_post("get_post"),
    None => Err(Error::NotFound { op: "get_post", entity: "post", key: id.to_owned() }),
  }
}

/// List posts in a subreddit with sorting, pagination, and an optional
/// inclusive creation-time range. An unknown subreddit yields an empty list.
pub(crate) fn in_subreddit(
  conn: &Connection,
  subreddit: &str,
  query: &PostQuery,
) -> Result<Vec<Post>> {
  let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE subreddit = ?1");
  if query.start.is_some() {
    sql.push_str(" AND created_utc >= ?2");
  }
  if query.end.is_some() {
    sql.push_str(" AND created_utc <= ?3");
  }

  // Sort column and direction come from closed enums, never from strings,
  // so interpolation is injection-safe.
  let column = match query.sort_by {
    SortField::Created => "created_utc",
    SortField::Score => "score",
    SortField::Comments => "num_comments",
  };
  let direction = match query.order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  };
  sql.push_str(&format!(" ORDER BY {column} {direction} LIMIT ?4 OFFSET ?5"));

  let mut stmt = conn.prepare(&sql).map_err(|e| Error::db("posts_in_subreddit", e))?;
  let raws = stmt
    .query_map(
      rusqlite::params![
        subreddit,
        query.start.map(encode_dt),
        query.end.map(encode_dt),
        query.limit.unwrap_or(DEFAULT_LIMIT) as i64,
        query.offset.unwrap_or(0) as i64,
      ],
      scan_post,
    )
    .map_err(|e| Error::db("posts_in_subreddit", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| Error::db("posts_in_subreddit", e))?;

  raws.into_iter().map(|raw| raw.into_post("posts_in_subreddit")).collect()
}

/// Substring match over titles and bodies, highest score first.
pub(crate) fn search(conn: &Connection, text: &str, query: &PostQuery) -> Result<Vec<Post>> {
  let sql = format!(
    "SELECT {POST_COLUMNS} FROM posts
     WHERE title LIKE ?1 OR selftext LIKE ?1
     ORDER BY score DESC
     LIMIT ?2 OFFSET ?3"
  );

  let pattern = format!("%{text}%");
  let mut stmt = conn.prepare(&sql).map_err(|e| Error::db("search_posts", e))?;
  let raws = stmt
    .query_map(
      rusqlite::params![
        pattern,
        query.limit.unwrap_or(DEFAULT_LIMIT) as i64,
        query.offset.unwrap_or(0) as i64,
      ],
      scan_post,
    )
    .map_err(|e| Error::db("search_posts", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| Error::db("search_posts", e))?;

  raws.into_iter().map(|raw| raw.into_post("search_posts")).collect()
}

/// Aggregate thread statistics for a post.
pub(crate) fn stats(conn: &Connection, post_id: &str) -> Result<PostStats> {
  let last_updated: Option<String> = conn
    .query_row(
      "SELECT last_updated FROM posts WHERE id = ?1",
      rusqlite::params![post_id],
      |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::db("post_stats", e))?;

  let Some(last_updated) = last_updated else {
    return Err(Error::NotFound {
      op:     "post_stats",
      entity: "post",
      key:    post_id.to_owned(),
    });
  };

  let (comment_count, max_depth): (i64, i64) = conn
    .query_row(
      "SELECT COUNT(*), COALESCE(MAX(depth), 0) FROM comments WHERE post_id = ?1",
      rusqlite::params![post_id],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(|e| Error::db("post_stats", e))?;

  Ok(PostStats {
    post_id:       post_id.to_owned(),
    comment_count: comment_count as u64,
    max_depth:     max_depth as u32,
    last_updated:  crate::encode::decode_dt("post_stats", &last_updated)?,
  })
}

fn scan_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPost> {
  Ok(RawPost {
    id:           row.get(0)?,
    subreddit:    row.get(1)?,
    author:       row.get(2)?,
    title:        row.get(3)?,
    selftext:     row.get(4)?,
    url:          row.get(5)?,
    score:        row.get(6)?,
    num_comments: row.get(7)?,
    created_utc:  row.get(8)?,
    edited_utc:   row.get(9)?,
    is_self:      row.get(10)?,
    is_video:     row.get(11)?,
    raw_json:     row.get(12)?,
    archived_at:  row.get(13)?,
    last_updated: row.get(14)?,
  })
}
