//! Error type for `trove-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] trove_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Operation attempted before `open()` or after `close()`.
  #[error("store is not open")]
  NotOpen,

  /// `initialize()` called against an already-initialized store; callers
  /// are expected to probe with `is_initialized()` first.
  #[error("store is already initialized")]
  AlreadyInitialized,

  #[error("input not found: {0}")]
  InputNotFound(String),

  #[error("note not found: {0}")]
  NoteNotFound(String),

  #[error("input content must not be empty")]
  EmptyContent,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
