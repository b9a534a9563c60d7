//! Query parameter and statistics types for post listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sortable columns for post queries. Anything outside this set falls back
/// to creation time — see [`SortField::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
  #[default]
  Created,
  Score,
  Comments,
}

impl SortField {
  /// Parse a user-supplied sort key. Unrecognized keys map to `Created`
  /// rather than erroring, so stale callers keep working.
  pub fn parse(s: &str) -> Self {
    match s {
      "score" => Self::Score,
      "comments" | "num_comments" => Self::Comments,
      _ => Self::Created,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Parameters for post listing queries.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
  /// Maximum rows returned; the store applies a default when unset.
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
  pub sort_by: SortField,
  pub order:   SortOrder,
  /// Inclusive creation-time range bounds.
  pub start:   Option<DateTime<Utc>>,
  pub end:     Option<DateTime<Utc>>,
}

/// Aggregate statistics for a single post's thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostStats {
  pub post_id:       String,
  pub comment_count: u64,
  /// Deepest nesting level present, 0 when the thread is empty.
  pub max_depth:     u32,
  pub last_updated:  DateTime<Utc>,
}
