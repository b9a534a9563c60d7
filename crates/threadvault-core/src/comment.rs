//! Comment — a threaded reply belonging to a post.
//!
//! Nesting depth is denormalized: the store computes it at save time from
//! the parent chain and writes it once. It is *not* recomputed if an
//! ancestor's relationship changes later; thread shape is treated as
//! append-only per comment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for saving a comment. Depth is intentionally absent — callers never
/// supply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
  pub id:         String,
  /// Owning post. Must already exist; comments cannot fabricate posts.
  pub post_id:    String,
  /// Parent comment id, or `None` for a direct child of the post. A value
  /// equal to `post_id` is treated the same as `None`.
  pub parent_id:  Option<String>,
  pub author:     String,
  pub body:       String,
  pub score:      i64,
  pub created_at: DateTime<Utc>,
  pub edited_at:  Option<DateTime<Utc>>,
  pub raw:        serde_json::Value,
}

/// A comment as stored, with its resolved depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub id:           String,
  pub post_id:      String,
  /// `None` for root comments — including comments whose declared parent
  /// could not be found anywhere (the defined orphan fallback).
  pub parent_id:    Option<String>,
  pub author:       String,
  pub body:         String,
  pub score:        i64,
  /// Zero-based nesting level relative to the post.
  pub depth:        u32,
  pub created_at:   DateTime<Utc>,
  pub edited_at:    Option<DateTime<Utc>>,
  pub last_updated: DateTime<Utc>,
  pub raw:          serde_json::Value,
}
