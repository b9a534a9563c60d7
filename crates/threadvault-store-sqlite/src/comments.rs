//! SQL for the `comments` table: depth-resolving upserts and the thread
//! reconstruction query.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension as _};
use threadvault_core::{Comment, NewComment};

use crate::{
  depth::{self, DepthError},
  encode::{encode_dt, encode_raw, RawComment},
  posts, Error, Result,
};

const UPSERT_SQL: &str = "
  INSERT INTO comments (
    id, post_id, parent_id, author, body, score,
    depth, created_utc, edited_utc, raw_json, last_updated
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
  ON CONFLICT (id) DO UPDATE SET
    score        = excluded.score,
    body         = excluded.body,
    edited_utc   = excluded.edited_utc,
    last_updated = excluded.last_updated,
    raw_json     = excluded.raw_json";

const COMMENT_COLUMNS: &str = "id, post_id, parent_id, author, body, score, depth, \
   created_utc, edited_utc, raw_json, last_updated";

/// Upsert a batch of comments. Owning posts must already exist. Depths are
/// resolved across the whole batch before any row is written; on conflict
/// only the mutable fields update — `depth` and `parent_id` are write-once,
/// so thread shape is never retroactively recomputed for existing rows.
pub(crate) fn upsert_many(
  conn: &Connection,
  op: &'static str,
  comments: &[NewComment],
  now: &str,
) -> Result<()> {
  if comments.is_empty() {
    return Ok(());
  }

  // Comments cannot fabricate their posts; a missing post fails the batch.
  // Each distinct post is checked once.
  let mut checked = std::collections::HashSet::new();
  for comment in comments {
    if checked.insert(comment.post_id.as_str()) && !posts::exists(conn, &comment.post_id)? {
      return Err(Error::ConstraintViolation {
        op,
        entity: "post",
        key: comment.post_id.clone(),
      });
    }
  }

  // Resolve depths per owning post, so a parent reference can only ever
  // bind to a comment on the same post; anything else takes the orphan
  // fallback. A declared parent equal to the post itself means "root".
  let mut by_post: HashMap<&str, HashMap<String, Option<String>>> = HashMap::new();
  for comment in comments {
    let parent = comment
      .parent_id
      .as_ref()
      .filter(|p| **p != comment.post_id)
      .cloned();
    by_post
      .entry(comment.post_id.as_str())
      .or_default()
      .insert(comment.id.clone(), parent);
  }

  let mut resolved: HashMap<String, depth::Resolved> = HashMap::with_capacity(comments.len());
  for (post_id, parents) in &by_post {
    let group = depth::resolve_batch(parents, |parent| {
      conn
        .query_row(
          "SELECT depth FROM comments WHERE id = ?1 AND post_id = ?2",
          rusqlite::params![parent, post_id],
          |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|d| d.map(|d| d as u32))
    })
    .map_err(|e| match e {
      DepthError::Cycle(id) => Error::CycleDetected(id),
      DepthError::Db(e) => Error::db(op, e),
    })?;
    resolved.extend(group);
  }

  // Shallowest first, so in-batch parents hit the table before their
  // children and the parent foreign key holds at every insert.
  let mut ordered: Vec<&NewComment> = comments.iter().collect();
  ordered.sort_by_key(|c| resolved[&c.id].depth);

  let mut stmt = conn.prepare(UPSERT_SQL).map_err(|e| Error::db(op, e))?;
  for comment in ordered {
    let raw = encode_raw(op, &comment.raw)?;
    let r = &resolved[&comment.id];
    stmt
      .execute(rusqlite::params![
        comment.id,
        comment.post_id,
        r.parent_id.as_deref(),
        comment.author,
        comment.body,
        comment.score,
        r.depth as i64,
        encode_dt(comment.created_at),
        comment.edited_at.map(encode_dt),
        raw,
        now,
      ])
      .map_err(|e| Error::db(op, e))?;
  }

  Ok(())
}

pub(crate) fn get(conn: &Connection, id: &str) -> Result<Comment> {
  let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
  let raw = conn
    .query_row(&sql, rusqlite::params![id], scan_comment)
    .optional()
    .map_err(|e| Error::db("get_comment", e))?;

  match raw {
    Some(raw) => raw.into_comment("get_comment"),
    None => Err(Error::NotFound { op: "get_comment", entity: "comment", key: id.to_owned() }),
  }
}

/// Every comment on a post as a flattened tree: recursive CTE from the root
/// comments, each node keyed by the concatenation of its ancestors'
/// fixed-width creation-time strings and its own. Sorting on that path puts
/// every comment after its parent and orders siblings by ascending creation
/// time; the id tiebreak keeps equal-timestamp siblings deterministic.
pub(crate) fn thread(conn: &Connection, post_id: &str) -> Result<Vec<Comment>> {
  let sql = format!(
    "WITH RECURSIVE thread AS (
       SELECT {COMMENT_COLUMNS}, created_utc AS sort_path
       FROM comments
       WHERE post_id = ?1 AND parent_id IS NULL

       UNION ALL

       SELECT c.id, c.post_id, c.parent_id, c.author, c.body, c.score, c.depth,
              c.created_utc, c.edited_utc, c.raw_json, c.last_updated,
              t.sort_path || c.created_utc
       FROM comments c
       JOIN thread t ON c.parent_id = t.id
     )
     SELECT {COMMENT_COLUMNS}
     FROM thread
     ORDER BY sort_path, id"
  );

  let mut stmt = conn.prepare(&sql).map_err(|e| Error::db("get_thread", e))?;
  let raws = stmt
    .query_map(rusqlite::params![post_id], scan_comment)
    .map_err(|e| Error::db("get_thread", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| Error::db("get_thread", e))?;

  raws.into_iter().map(|raw| raw.into_comment("get_thread")).collect()
}

fn scan_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawComment> {
  Ok(RawComment {
    id:           row.get(0)?,
    post_id:      row.get(1)?,
    parent_id:    row.get(2)?,
    author:       row.get(3)?,
    body:         row.get(4)?,
    score:        row.get(5)?,
    depth:        row.get(6)?,
    created_utc:  row.get(7)?,
    edited_utc:   row.get(8)?,
    raw_json:     row.get(9)?,
    last_updated: row.get(10)?,
  })
}
