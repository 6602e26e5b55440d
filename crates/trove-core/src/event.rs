//! Domain events — the append-only journal entries.
//!
//! Every mutation elsewhere in the ledger appends exactly one event. Events
//! are never updated or deleted; the log is a one-way sink plus an
//! independent query surface for external callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The closed set of recognised event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
  DbInitialized,
  InputStored,
  InputRedacted,
  NoteSeen,
  NoteMarkedDeleted,
  /// Reserved for a future note-merge operation; nothing emits it yet.
  NotesMerged,
  LinkAdded,
  LinkRemoved,
}

impl EventType {
  /// The discriminant string stored in the `event_type` column.
  /// Must match the `rename_all = "SCREAMING_SNAKE_CASE"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::DbInitialized => "DB_INITIALIZED",
      Self::InputStored => "INPUT_STORED",
      Self::InputRedacted => "INPUT_REDACTED",
      Self::NoteSeen => "NOTE_SEEN",
      Self::NoteMarkedDeleted => "NOTE_MARKED_DELETED",
      Self::NotesMerged => "NOTES_MERGED",
      Self::LinkAdded => "LINK_ADDED",
      Self::LinkRemoved => "LINK_REMOVED",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "DB_INITIALIZED" => Ok(Self::DbInitialized),
      "INPUT_STORED" => Ok(Self::InputStored),
      "INPUT_REDACTED" => Ok(Self::InputRedacted),
      "NOTE_SEEN" => Ok(Self::NoteSeen),
      "NOTE_MARKED_DELETED" => Ok(Self::NoteMarkedDeleted),
      "NOTES_MERGED" => Ok(Self::NotesMerged),
      "LINK_ADDED" => Ok(Self::LinkAdded),
      "LINK_REMOVED" => Ok(Self::LinkRemoved),
      other => Err(Error::UnknownEventType(other.to_owned())),
    }
  }
}

/// One journal entry. `event_id` is assigned by the store, monotonically
/// increasing and never reused; insertion order, id order, and timestamp
/// order coincide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:   i64,
  pub event_type: EventType,
  pub timestamp:  DateTime<Utc>,
  /// Event-specific structured payload; opaque to the ledger.
  pub payload:    serde_json::Value,
}
