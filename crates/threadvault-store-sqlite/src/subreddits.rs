//! SQL for the `subreddits` table.

use rusqlite::{Connection, OptionalExtension as _};
use threadvault_core::{NewSubreddit, Subreddit};

use crate::{
  encode::{encode_dt, encode_raw, RawSubreddit},
  Error, Result,
};

/// Insert a subreddit or refresh its mutable fields. The natural key
/// (`name`) and reported creation time are never rewritten.
pub(crate) fn upsert(conn: &Connection, sub: &NewSubreddit, now: &str) -> Result<()> {
  let raw = encode_raw("save_subreddit", &sub.raw)?;

  conn
    .execute(
      "INSERT INTO subreddits (
         name, title, description, subscribers, created_utc, raw_json, last_synced
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT (name) DO UPDATE SET
         title       = excluded.title,
         description = excluded.description,
         subscribers = excluded.subscribers,
         last_synced = excluded.last_synced,
         raw_json    = excluded.raw_json",
      rusqlite::params![
        sub.name,
        sub.title,
        sub.description,
        sub.subscribers,
        sub.created_at.map(encode_dt),
        raw,
        now,
      ],
    )
    .map_err(|e| Error::db("save_subreddit", e))?;

  Ok(())
}

/// Make sure a subreddit row exists for `name` without touching metadata
/// that an explicit save may already have written. Used when posts arrive
/// before their subreddit has ever been saved.
pub(crate) fn ensure(conn: &Connection, name: &str, now: &str) -> Result<()> {
  let stub = NewSubreddit::stub(name);
  let raw = encode_raw("ensure_subreddit", &stub.raw)?;

  conn
    .execute(
      "INSERT INTO subreddits (
         name, title, description, subscribers, created_utc, raw_json, last_synced
       ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)
       ON CONFLICT (name) DO NOTHING",
      rusqlite::params![stub.name, stub.title, stub.description, stub.subscribers, raw, now],
    )
    .map_err(|e| Error::db("ensure_subreddit", e))?;

  Ok(())
}

pub(crate) fn get(conn: &Connection, name: &str) -> Result<Subreddit> {
  let raw = conn
    .query_row(
      "SELECT name, title, description, subscribers, created_utc, raw_json, last_synced
       FROM subreddits
       WHERE name = ?1",
      rusqlite::params![name],
      |row| {
        Ok(RawSubreddit {
          name:        row.get(0)?,
          title:       row.get(1)?,
          description: row.get(2)?,
          subscribers: row.get(3)?,
          created_utc: row.get(4)?,
          raw_json:    row.get(5)?,
          last_synced: row.get(6)?,
        })
      },
    )
    .optional()
    .map_err(|e| Error::db("get_subreddit", e))?;

  match raw {
    Some(raw) => raw.into_subreddit("get_subreddit"),
    None => Err(Error::NotFound {
      op:     "get_subreddit",
      entity: "subreddit",
      key:    name.to_owned(),
    }),
  }
}
