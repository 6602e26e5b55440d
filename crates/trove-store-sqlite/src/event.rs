//! [`EventLog`] — the append-only journal.
//!
//! Written to by every other component (within their transactions, via
//! [`append_event`]) but never read by them; the query surface exists for
//! external callers only.

use trove_core::{
  Event, EventQuery, EventType,
  time::{encode_timestamp, now_millis},
};

use crate::{Result, encode::RawEvent, store::Store};

pub struct EventLog {
  store: Store,
}

impl EventLog {
  pub fn new(store: Store) -> Self {
    Self { store }
  }

  /// Append one event; the store assigns `event_id` and the timestamp.
  pub async fn append(
    &self,
    event_type: EventType,
    payload: serde_json::Value,
  ) -> Result<Event> {
    let now = now_millis();
    let now_str = encode_timestamp(now);
    let payload_for_insert = payload.clone();

    let event_id = self
      .store
      .call(move |conn| {
        Ok(append_event(conn, event_type, &payload_for_insert, &now_str)?)
      })
      .await?;

    Ok(Event { event_id, event_type, timestamp: now, payload })
  }

  /// Events matching `query`, ascending by `event_id` (equivalently:
  /// insertion order and timestamp order). `limit` defaults to 100.
  pub async fn query(&self, query: &EventQuery) -> Result<Vec<Event>> {
    let type_str = query.event_type.map(EventType::as_str);
    let since_str = query.since.map(encode_timestamp);
    let limit = query.limit.unwrap_or(100) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawEvent> = self
      .store
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if type_str.is_some() {
          conds.push("event_type = ?1");
        }
        if since_str.is_some() {
          conds.push("timestamp >= ?2");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT event_id, event_type, timestamp, payload FROM events
           {where_clause}
           ORDER BY event_id ASC LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![type_str, since_str.as_deref(), limit, offset],
            RawEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

/// Synchronous append used inside other components' transactions so the
/// entity write and its event land in the same unit of work.
///
/// Returns the assigned `event_id`.
pub(crate) fn append_event(
  conn: &rusqlite::Connection,
  event_type: EventType,
  payload: &serde_json::Value,
  timestamp: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO events (event_type, timestamp, payload) VALUES (?1, ?2, ?3)",
    rusqlite::params![event_type.as_str(), timestamp, payload.to_string()],
  )?;
  Ok(conn.last_insert_rowid())
}
