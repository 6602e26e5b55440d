//! Decoding helpers between SQLite rows and the domain types.
//!
//! Timestamps travel as RFC 3339 UTC strings with fixed millisecond
//! precision (see [`trove_core::time`]); metadata as compact JSON blobs;
//! input state as the lowercase discriminant checked by the schema.

use trove_core::{
  Event, EventType, Input, InputState, Link, Note,
  meta::decode_meta,
  time::decode_timestamp,
};

use crate::Result;

// ─── InputState ──────────────────────────────────────────────────────────────

pub fn encode_state(state: InputState) -> &'static str {
  match state {
    InputState::Active => "active",
    InputState::Redacted => "redacted",
  }
}

pub fn decode_state(s: &str) -> Result<InputState> {
  match s {
    "active" => Ok(InputState::Active),
    "redacted" => Ok(InputState::Redacted),
    other => {
      Err(trove_core::Error::UnknownInputState(other.to_owned()).into())
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `inputs` row.
pub struct RawInput {
  pub input_id:       String,
  pub content:        Option<String>,
  pub content_sha256: String,
  pub state:          String,
  pub created_at:     String,
  pub meta_json:      Option<String>,
}

impl RawInput {
  /// Row mapper for `SELECT input_id, content, content_sha256, state,
  /// created_at, meta_json`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      input_id:       row.get(0)?,
      content:        row.get(1)?,
      content_sha256: row.get(2)?,
      state:          row.get(3)?,
      created_at:     row.get(4)?,
      meta_json:      row.get(5)?,
    })
  }

  pub fn into_input(self) -> Result<Input> {
    Ok(Input {
      input_id:       self.input_id,
      content:        self.content,
      content_sha256: self.content_sha256,
      state:          decode_state(&self.state)?,
      created_at:     decode_timestamp(&self.created_at)?,
      meta:           decode_meta(self.meta_json.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `notes` row.
pub struct RawNote {
  pub note_id:      String,
  pub created_at:   String,
  pub last_seen_at: String,
  pub meta_json:    Option<String>,
}

impl RawNote {
  /// Row mapper for `SELECT note_id, created_at, last_seen_at, meta_json`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      note_id:      row.get(0)?,
      created_at:   row.get(1)?,
      last_seen_at: row.get(2)?,
      meta_json:    row.get(3)?,
    })
  }

  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      note_id:      self.note_id,
      created_at:   decode_timestamp(&self.created_at)?,
      last_seen_at: decode_timestamp(&self.last_seen_at)?,
      meta:         decode_meta(self.meta_json.as_deref())?,
    })
  }
}

/// Raw strings read directly from an `input_note_links` row.
pub struct RawLink {
  pub input_id:   String,
  pub note_id:    String,
  pub created_at: String,
}

impl RawLink {
  /// Row mapper for `SELECT input_id, note_id, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      input_id:   row.get(0)?,
      note_id:    row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_link(self) -> Result<Link> {
    Ok(Link {
      input_id:   self.input_id,
      note_id:    self.note_id,
      created_at: decode_timestamp(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:   i64,
  pub event_type: String,
  pub timestamp:  String,
  pub payload:    String,
}

impl RawEvent {
  /// Row mapper for `SELECT event_id, event_type, timestamp, payload`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:   row.get(0)?,
      event_type: row.get(1)?,
      timestamp:  row.get(2)?,
      payload:    row.get(3)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:   self.event_id,
      event_type: EventType::parse(&self.event_type)?,
      timestamp:  decode_timestamp(&self.timestamp)?,
      payload:    serde_json::from_str(&self.payload)?,
    })
  }
}
