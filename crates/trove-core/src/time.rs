//! Canonical timestamp representation.
//!
//! All instants are stored and interchanged as RFC 3339 UTC strings with a
//! fixed millisecond fraction (`2024-01-01T00:00:00.000Z`). The fixed width
//! makes lexicographic comparison in SQL equal to chronological comparison,
//! which the stale-note and event-since queries rely on.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::{Error, Result};

/// The current instant, truncated to the stored millisecond precision so
/// a value handed back to a caller compares equal to the same value read
/// back from storage.
pub fn now_millis() -> DateTime<Utc> {
  let now = Utc::now();
  now - Duration::nanoseconds(i64::from(now.timestamp_subsec_nanos() % 1_000_000))
}

pub fn encode_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::TimestampParse(format!("{s:?}: {e}")))
}
