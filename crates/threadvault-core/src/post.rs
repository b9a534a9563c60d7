//! Post — a top-level content record belonging to a subreddit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for saving a post. `id` is the natural key; repeated saves of the
/// same id update the mutable fields (score, comment count, edit time,
/// payload) and never create a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
  pub id:           String,
  /// Owning subreddit name. Created implicitly if it does not exist yet.
  pub subreddit:    String,
  pub author:       String,
  pub title:        String,
  pub selftext:     String,
  pub url:          String,
  pub score:        i64,
  pub num_comments: i64,
  pub created_at:   DateTime<Utc>,
  pub edited_at:    Option<DateTime<Utc>>,
  pub is_self:      bool,
  pub is_video:     bool,
  pub raw:          serde_json::Value,
}

/// A post as stored, including store-assigned timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub id:           String,
  pub subreddit:    String,
  pub author:       String,
  pub title:        String,
  pub selftext:     String,
  pub url:          String,
  pub score:        i64,
  pub num_comments: i64,
  pub created_at:   DateTime<Utc>,
  pub edited_at:    Option<DateTime<Utc>>,
  pub is_self:      bool,
  pub is_video:     bool,
  /// Set on first insert, never touched afterwards.
  pub archived_at:  DateTime<Utc>,
  /// Advanced on every save.
  pub last_updated: DateTime<Utc>,
  pub raw:          serde_json::Value,
}
