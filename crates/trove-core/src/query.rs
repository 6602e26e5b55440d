//! Query parameter types and derived read models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{event::EventType, input::InputState};

/// Parameters for the event-log query. Missing filters impose no
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub event_type: Option<EventType>,
  /// Inclusive lower bound on the event timestamp.
  pub since:      Option<DateTime<Utc>>,
  /// Defaults to 100. Any upper cap is the boundary layer's business.
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// Parameters for listing inputs.
#[derive(Debug, Clone, Default)]
pub struct InputQuery {
  pub state:  Option<InputState>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Row counts per table, reported by the store's status probe.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Stats {
  pub inputs: u64,
  pub notes:  u64,
  pub links:  u64,
  pub events: u64,
}
