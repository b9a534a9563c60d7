//! Error type for `threadvault-store-sqlite`.
//!
//! Every variant that wraps an underlying failure carries the name of the
//! storage operation that produced it; nothing is swallowed and nothing is
//! retried here — all writes are idempotent, so callers may safely
//! re-invoke.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Lookup by natural key matched no row.
  #[error("{op}: {entity} not found: {key}")]
  NotFound {
    op:     &'static str,
    entity: &'static str,
    key:    String,
  },

  /// A required parent reference does not exist and cannot be implicitly
  /// created (e.g. a comment whose post was never saved).
  #[error("{op}: required {entity} {key} does not exist")]
  ConstraintViolation {
    op:     &'static str,
    entity: &'static str,
    key:    String,
  },

  /// The raw payload could not be encoded.
  #[error("{op}: payload serialization failed: {source}")]
  Serialization {
    op:     &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// Depth resolution found a comment that is its own ancestor within a
  /// batch.
  #[error("cyclic parent chain detected at comment {0}")]
  CycleDetected(String),

  /// The embedded migration set is malformed (non-positive, duplicate, or
  /// non-monotonic versions). Raised at runner construction, before any
  /// SQL executes.
  #[error("invalid migration set: {0}")]
  InvalidMigrations(String),

  /// A migration script or its ledger write failed. The schema is left at
  /// the last successfully applied version.
  #[error("migration {version} ({name}) failed: {source}")]
  Migration {
    version: i64,
    name:    &'static str,
    #[source]
    source:  rusqlite::Error,
  },

  /// Any other underlying store failure, wrapped with the operation name.
  #[error("{op}: database error: {source}")]
  Database {
    op:     &'static str,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// The database could not be opened or closed.
  #[error("connection failure: {0}")]
  Connection(#[source] tokio_rusqlite::Error),

  /// A stored value could not be decoded back into its domain type.
  #[error("{op}: malformed stored value: {detail}")]
  Decode { op: &'static str, detail: String },
}

impl Error {
  /// Wrap an in-transaction rusqlite failure with the operation name.
  pub(crate) fn db(op: &'static str, source: rusqlite::Error) -> Self {
    Self::Database { op, source: source.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
