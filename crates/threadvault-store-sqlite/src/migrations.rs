//! Versioned schema migrations and the runner that applies them.
//!
//! The migration set is embedded in the binary and fixed at construction
//! time. Each pending migration executes its SQL and appends its ledger row
//! inside one transaction, so a migration either fully applies and is
//! recorded, or leaves no trace. Re-running the runner is a no-op once all
//! known versions are applied.
//!
//! The `schema_migrations` ledger (version, name, applied_at) is append-only
//! and is itself a compatibility surface: its shape must not change without
//! a new migration.

use chrono::Utc;

use crate::{encode::encode_dt, Error, Result};

/// A single versioned schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
  /// Positive, unique, strictly increasing across the set.
  pub version: i64,
  pub name:    &'static str,
  pub sql:     &'static str,
}

/// The embedded SQLite migration set, in application order.
pub const MIGRATIONS: &[Migration] = &[
  Migration { version: 1, name: "initial_schema", sql: INITIAL_SCHEMA },
  Migration { version: 2, name: "query_indexes", sql: QUERY_INDEXES },
];

const INITIAL_SCHEMA: &str = "
CREATE TABLE subreddits (
    name        TEXT PRIMARY KEY,
    title       TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    subscribers INTEGER NOT NULL DEFAULT 0,
    created_utc TEXT,
    raw_json    TEXT NOT NULL,
    last_synced TEXT NOT NULL
);

CREATE TABLE posts (
    id           TEXT PRIMARY KEY,
    subreddit    TEXT NOT NULL REFERENCES subreddits(name) ON DELETE CASCADE,
    author       TEXT NOT NULL DEFAULT '',
    title        TEXT NOT NULL DEFAULT '',
    selftext     TEXT NOT NULL DEFAULT '',
    url          TEXT NOT NULL DEFAULT '',
    score        INTEGER NOT NULL DEFAULT 0,
    num_comments INTEGER NOT NULL DEFAULT 0,
    created_utc  TEXT NOT NULL,
    edited_utc   TEXT,
    is_self      INTEGER NOT NULL DEFAULT 0,
    is_video     INTEGER NOT NULL DEFAULT 0,
    raw_json     TEXT NOT NULL,
    archived_at  TEXT NOT NULL,   -- set on first insert, never updated
    last_updated TEXT NOT NULL
);

CREATE TABLE comments (
    id           TEXT PRIMARY KEY,
    post_id      TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    parent_id    TEXT REFERENCES comments(id) ON DELETE CASCADE,
    author       TEXT NOT NULL DEFAULT '',
    body         TEXT NOT NULL DEFAULT '',
    score        INTEGER NOT NULL DEFAULT 0,
    depth        INTEGER NOT NULL DEFAULT 0,  -- resolved at save time, write-once
    created_utc  TEXT NOT NULL,
    edited_utc   TEXT,
    raw_json     TEXT NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE INDEX idx_posts_subreddit   ON posts(subreddit);
CREATE INDEX idx_posts_created     ON posts(created_utc);
CREATE INDEX idx_comments_post     ON comments(post_id);
CREATE INDEX idx_comments_parent   ON comments(parent_id);
";

const QUERY_INDEXES: &str = "
CREATE INDEX idx_posts_score        ON posts(score);
CREATE INDEX idx_posts_num_comments ON posts(num_comments);
";

const LEDGER_DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Applies an embedded migration set exactly once per version, tracked in
/// the `schema_migrations` ledger.
#[derive(Debug)]
pub struct MigrationRunner {
  migrations: &'static [Migration],
}

impl MigrationRunner {
  /// Build a runner over `migrations`, validating the set up front:
  /// versions must be positive and strictly increasing.
  pub fn new(migrations: &'static [Migration]) -> Result<Self> {
    let mut prev = 0i64;
    for m in migrations {
      if m.version <= 0 {
        return Err(Error::InvalidMigrations(format!(
          "version {} ({}) is not positive",
          m.version, m.name
        )));
      }
      if m.version <= prev {
        return Err(Error::InvalidMigrations(format!(
          "version {} ({}) does not increase past {prev}",
          m.version, m.name
        )));
      }
      prev = m.version;
    }
    Ok(Self { migrations })
  }

  /// Apply every pending migration in ascending version order. Returns the
  /// number applied; 0 means the schema was already current. Stops at the
  /// first failure, leaving the schema at the last applied version.
  pub async fn apply(&self, conn: &tokio_rusqlite::Connection) -> Result<u32> {
    let migrations = self.migrations;
    let applied = conn
      .call(move |conn| Ok(apply_pending(conn, migrations)))
      .await
      .map_err(|source| Error::Database { op: "apply_migrations", source })??;

    if applied > 0 {
      tracing::info!(applied, "applied schema migrations");
    }
    Ok(applied)
  }

  /// The highest version recorded in the ledger, 0 when nothing has been
  /// applied yet.
  pub async fn current_version(&self, conn: &tokio_rusqlite::Connection) -> Result<i64> {
    let version = conn
      .call(|conn| {
        conn.execute(LEDGER_DDL, [])?;
        let v = conn.query_row(
          "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
          [],
          |row| row.get(0),
        )?;
        Ok(v)
      })
      .await
      .map_err(|source| Error::Database { op: "current_version", source })?;
    Ok(version)
  }
}

fn apply_pending(conn: &mut rusqlite::Connection, migrations: &'static [Migration]) -> Result<u32> {
  conn
    .execute(LEDGER_DDL, [])
    .map_err(|e| Error::db("create_migration_ledger", e))?;

  let current: i64 = conn
    .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
    .map_err(|e| Error::db("read_migration_ledger", e))?;

  let mut applied = 0u32;
  for m in migrations.iter().filter(|m| m.version > current) {
    apply_one(conn, m).map_err(|source| Error::Migration {
      version: m.version,
      name:    m.name,
      source,
    })?;
    tracing::info!(version = m.version, name = m.name, "migration applied");
    applied += 1;
  }
  Ok(applied)
}

/// Script execution and ledger append succeed or fail together.
fn apply_one(conn: &mut rusqlite::Connection, m: &Migration) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute_batch(m.sql)?;
  tx.execute(
    "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
    rusqlite::params![m.version, m.name, encode_dt(Utc::now())],
  )?;
  tx.commit()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_set_is_well_formed() {
    MigrationRunner::new(MIGRATIONS).unwrap();
  }

  #[test]
  fn duplicate_version_is_rejected() {
    const BAD: &[Migration] = &[
      Migration { version: 1, name: "a", sql: "" },
      Migration { version: 1, name: "b", sql: "" },
    ];
    let err = MigrationRunner::new(BAD).unwrap_err();
    assert!(matches!(err, Error::InvalidMigrations(_)));
  }

  #[test]
  fn non_monotonic_version_is_rejected() {
    const BAD: &[Migration] = &[
      Migration { version: 2, name: "a", sql: "" },
      Migration { version: 1, name: "b", sql: "" },
    ];
    assert!(matches!(
      MigrationRunner::new(BAD),
      Err(Error::InvalidMigrations(_))
    ));
  }

  #[test]
  fn non_positive_version_is_rejected() {
    const BAD: &[Migration] = &[Migration { version: 0, name: "a", sql: "" }];
    assert!(matches!(
      MigrationRunner::new(BAD),
      Err(Error::InvalidMigrations(_))
    ));
  }

  #[tokio::test]
  async fn failing_migration_names_its_version() {
    const BROKEN: &[Migration] = &[
      Migration { version: 1, name: "ok", sql: "CREATE TABLE t (x INTEGER);" },
      Migration { version: 2, name: "broken", sql: "THIS IS NOT SQL;" },
    ];

    let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
    let runner = MigrationRunner::new(BROKEN).unwrap();

    let err = runner.apply(&conn).await.unwrap_err();
    assert!(matches!(err, Error::Migration { version: 2, .. }));

    // Version 1 applied and stays applied; version 2 left no ledger row.
    assert_eq!(runner.current_version(&conn).await.unwrap(), 1);
  }
}
