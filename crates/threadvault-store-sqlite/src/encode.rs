//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width UTC strings (millisecond precision,
//! trailing `Z`). Fixed width matters: the thread reconstruction query
//! builds sort paths by concatenating creation-time keys, which is only
//! lexicographically correct when every key has the same length. Raw
//! payloads are stored as compact JSON text.

use chrono::{DateTime, Utc};
use threadvault_core::{Comment, Post, Subreddit};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

const DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.format(DT_FORMAT).to_string()
}

pub(crate) fn decode_dt(op: &'static str, s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode { op, detail: format!("timestamp {s:?}: {e}") })
}

fn decode_opt_dt(op: &'static str, s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(|s| decode_dt(op, s)).transpose()
}

// ─── Raw payload ─────────────────────────────────────────────────────────────

pub(crate) fn encode_raw(op: &'static str, raw: &serde_json::Value) -> Result<String> {
  serde_json::to_string(raw).map_err(|source| Error::Serialization { op, source })
}

fn decode_raw(op: &'static str, s: &str) -> Result<serde_json::Value> {
  serde_json::from_str(s)
    .map_err(|e| Error::Decode { op, detail: format!("raw payload: {e}") })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `subreddits` row.
pub(crate) struct RawSubreddit {
  pub name:        String,
  pub title:       String,
  pub description: String,
  pub subscribers: i64,
  pub created_utc: Option<String>,
  pub raw_json:    String,
  pub last_synced: String,
}

impl RawSubreddit {
  pub fn into_subreddit(self, op: &'static str) -> Result<Subreddit> {
    Ok(Subreddit {
      name:        self.name,
      title:       self.title,
      description: self.description,
      subscribers: self.subscribers,
      created_at:  decode_opt_dt(op, self.created_utc)?,
      last_synced: decode_dt(op, &self.last_synced)?,
      raw:         decode_raw(op, &self.raw_json)?,
    })
  }
}

/// Raw strings read directly from a `posts` row.
pub(crate) struct RawPost {
  pub id:           String,
  pub subreddit:    String,
  pub author:       String,
  pub title:        String,
  pub selftext:     String,
  pub url:          String,
  pub score:        i64,
  pub num_comments: i64,
  pub created_utc:  String,
  pub edited_utc:   Option<String>,
  pub is_self:      bool,
  pub is_video:     bool,
  pub raw_json:     String,
  pub archived_at:  String,
  pub last_updated: String,
}

impl RawPost {
  pub fn into_post(self, op: &'static str) -> Result<Post> {
    Ok(Post {
      id:           self.id,
      subreddit:    self.subreddit,
      author:       self.author,
      title:        self.title,
      selftext:     self.selftext,
      url:          self.url,
      score:        self.score,
      num_comments: self.num_comments,
      created_at:   decode_dt(op, &self.created_utc)?,
      edited_at:    decode_opt_dt(op, self.edited_utc)?,
      is_self:      self.is_self,
      is_video:     self.is_video,
      archived_at:  decode_dt(op, &self.archived_at)?,
      last_updated: decode_dt(op, &self.last_updated)?,
      raw:          decode_raw(op, &self.raw_json)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub(crate) struct RawComment {
  pub id:           String,
  pub post_id:      String,
  pub parent_id:    Option<String>,
  pub author:       String,
  pub body:         String,
  pub score:        i64,
  pub depth:        i64,
  pub created_utc:  String,
  pub edited_utc:   Option<String>,
  pub raw_json:     String,
  pub last_updated: String,
}

impl RawComment {
  pub fn into_comment(self, op: &'static str) -> Result<Comment> {
    let depth = u32::try_from(self.depth)
      .map_err(|_| Error::Decode { op, detail: format!("negative depth {}", self.depth) })?;

    Ok(Comment {
      id:           self.id,
      post_id:      self.post_id,
      parent_id:    self.parent_id,
      author:       self.author,
      body:         self.body,
      score:        self.score,
      depth,
      created_at:   decode_dt(op, &self.created_utc)?,
      edited_at:    decode_opt_dt(op, self.edited_utc)?,
      last_updated: decode_dt(op, &self.last_updated)?,
      raw:          decode_raw(op, &self.raw_json)?,
    })
  }
}
