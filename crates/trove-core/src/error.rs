//! Error types for `trove-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown event type: {0:?}")]
  UnknownEventType(String),

  #[error("unknown input state: {0:?}")]
  UnknownInputState(String),

  #[error("timestamp parse error: {0}")]
  TimestampParse(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
