//! Link — a provenance edge between one input and one note.
//!
//! Identified by the (input_id, note_id) pair; there is no surrogate key.
//! A link outlives redaction of its input — redaction must never hide
//! provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
  pub input_id:   String,
  pub note_id:    String,
  pub created_at: DateTime<Utc>,
}
