//! Input — a stored raw source artifact, deduplicated by content hash.
//!
//! Inputs are content-addressable: at most one *active* input exists per
//! distinct SHA-256 digest. Redaction nulls the content and tombstones the
//! row out of the uniqueness check, so identical content can be stored
//! again afterwards as a fresh active input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::meta::Meta;

/// Lifecycle state of an input. `active → redacted` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputState {
  Active,
  Redacted,
}

/// A raw source artifact. `content` is `None` exactly when
/// `state == Redacted`; the digest is computed at store time and never
/// changes, redacted or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
  pub input_id:       String,
  pub content:        Option<String>,
  pub content_sha256: String,
  pub state:          InputState,
  pub created_at:     DateTime<Utc>,
  pub meta:           Option<Meta>,
}

/// Hex SHA-256 digest of `content`, the dedup key for inputs.
pub fn content_sha256(content: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(content.as_bytes());
  hex::encode(hasher.finalize())
}
