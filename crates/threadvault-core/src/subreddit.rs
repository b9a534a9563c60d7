//! Subreddit — the named collection that owns posts.
//!
//! A subreddit is created implicitly the first time a post referencing it is
//! saved, and refreshed by every explicit save. It is never deleted by this
//! layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for saving a subreddit. `name` is the natural key and is immutable
/// once the row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubreddit {
  pub name:        String,
  pub title:       String,
  pub description: String,
  pub subscribers: i64,
  /// Creation time reported by the source, when it reports one.
  pub created_at:  Option<DateTime<Utc>>,
  /// Opaque snapshot of the source record, kept for reprocessing.
  pub raw:         serde_json::Value,
}

impl NewSubreddit {
  /// A name-only stub, used when a post references a subreddit that has
  /// never been saved explicitly. Carries no metadata worth overwriting.
  pub fn stub(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      title:       String::new(),
      description: String::new(),
      subscribers: 0,
      created_at:  None,
      raw:         serde_json::Value::Null,
    }
  }
}

/// A subreddit as stored, including the store-assigned sync timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subreddit {
  pub name:        String,
  pub title:       String,
  pub description: String,
  pub subscribers: i64,
  pub created_at:  Option<DateTime<Utc>>,
  /// Advanced on every save.
  pub last_synced: DateTime<Utc>,
  pub raw:         serde_json::Value,
}
