//! Metadata maps.
//!
//! Callers attach opaque key/value metadata to inputs and notes. The ledger
//! persists it as a JSON blob and never branches on its contents, with one
//! exception: the deletion tombstone, a generic shallow merge that
//! overwrites exactly two keys.

use chrono::{DateTime, Utc};

use crate::{Result, time::encode_timestamp};

/// An opaque structured map, caller-supplied.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Serialise an optional meta map to its stored blob form.
pub fn encode_meta(meta: Option<&Meta>) -> Result<Option<String>> {
  meta.map(|m| Ok(serde_json::to_string(m)?)).transpose()
}

/// Parse a stored blob back into a meta map.
pub fn decode_meta(raw: Option<&str>) -> Result<Option<Meta>> {
  raw.map(|s| Ok(serde_json::from_str(s)?)).transpose()
}

/// Merge the deletion tombstone into `meta`.
///
/// Existing keys are preserved; `deleted` and `deleted_at` are overwritten.
pub fn merge_tombstone(meta: Option<Meta>, deleted_at: DateTime<Utc>) -> Meta {
  let mut merged = meta.unwrap_or_default();
  merged.insert("deleted".to_owned(), serde_json::Value::Bool(true));
  merged.insert(
    "deleted_at".to_owned(),
    serde_json::Value::String(encode_timestamp(deleted_at)),
  );
  merged
}
