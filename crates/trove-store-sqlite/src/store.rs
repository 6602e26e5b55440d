//! [`Store`] — connection lifecycle and schema ownership.

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::Mutex;
use trove_core::{EventType, Stats, time::encode_timestamp};

use crate::{Error, Result, event::append_event, schema::SCHEMA};

/// An explicitly owned handle to one embedded SQLite connection.
///
/// Cloning is cheap; all clones share the same underlying connection, so
/// `close()` on any clone closes them all. Each repository component is
/// constructed with its own clone (dependency injection — no process-wide
/// singleton, so tests can run isolated instances side by side).
///
/// Opening establishes the connection and pragmas only; the schema is
/// created by an explicit [`Store::initialize`] call.
#[derive(Clone)]
pub struct Store {
  conn: Arc<Mutex<Option<tokio_rusqlite::Connection>>>,
}

impl Store {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an ephemeral in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    // WAL for durability on file-backed stores (in-memory databases report
    // journal_mode = memory, which is fine); foreign keys are off by
    // default in SQLite and the link table relies on them.
    conn
      .call(|conn| {
        conn.execute_batch(
          "PRAGMA journal_mode = WAL;
           PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
      })
      .await?;

    Ok(Self { conn: Arc::new(Mutex::new(Some(conn))) })
  }

  /// Create the schema and append the `DB_INITIALIZED` event.
  ///
  /// Initializing twice is a caller contract violation; probe with
  /// [`Store::is_initialized`] first.
  pub async fn initialize(&self) -> Result<()> {
    if self.is_initialized().await {
      return Err(Error::AlreadyInitialized);
    }

    let now_str = encode_timestamp(Utc::now());
    let payload = serde_json::json!({ "initialized_at": now_str });

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        append_event(&tx, EventType::DbInitialized, &payload, &now_str)?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  /// Whether the schema exists. A safe existence probe: returns `false` on
  /// any inspection failure (closed store included) rather than erroring.
  pub async fn is_initialized(&self) -> bool {
    let Ok(conn) = self.handle().await else {
      return false;
    };

    conn
      .call(|conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'events'",
            [],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(exists)
      })
      .await
      .unwrap_or(false)
  }

  /// Release the connection. Subsequent operations on this store (or any
  /// clone of it) fail with [`Error::NotOpen`].
  pub async fn close(&self) -> Result<()> {
    let conn = self.conn.lock().await.take().ok_or(Error::NotOpen)?;
    conn.close().await?;
    Ok(())
  }

  /// Row counts for all four tables.
  pub async fn stats(&self) -> Result<Stats> {
    self
      .call(|conn| {
        let inputs: u64 =
          conn.query_row("SELECT COUNT(*) FROM inputs", [], |r| r.get(0))?;
        let notes: u64 =
          conn.query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))?;
        let links: u64 = conn.query_row(
          "SELECT COUNT(*) FROM input_note_links",
          [],
          |r| r.get(0),
        )?;
        let events: u64 =
          conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
        Ok(Stats { inputs, notes, links, events })
      })
      .await
  }

  /// Run `f` on the database thread, or fail with [`Error::NotOpen`].
  pub(crate) async fn call<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T>
      + Send
      + 'static,
    T: Send + 'static,
  {
    let conn = self.handle().await?;
    Ok(conn.call(f).await?)
  }

  async fn handle(&self) -> Result<tokio_rusqlite::Connection> {
    self.conn.lock().await.clone().ok_or(Error::NotOpen)
  }
}
