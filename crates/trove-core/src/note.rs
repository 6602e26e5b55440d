//! Note — a registered derived document, tracked by first/last-seen
//! timestamps.
//!
//! Notes carry no explicit `deleted` column. Deletion is recorded by
//! merging a tombstone into the metadata map (see [`crate::meta`]); the row
//! itself is never removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::Meta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
  pub note_id:      String,
  /// Set on first registration; never changes afterwards.
  pub created_at:   DateTime<Utc>,
  /// Bumped on every registration.
  pub last_seen_at: DateTime<Utc>,
  pub meta:         Option<Meta>,
}
