//! SQL schema for the trove SQLite store.
//!
//! Executed by [`crate::Store::initialize`], never implicitly at open time.
//! The boundary layer may run `initialize()` against a fresh location at
//! any point and relies on exactly this table and index set existing
//! afterwards.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS inputs (
    input_id       TEXT PRIMARY KEY,
    content        TEXT,            -- NULL exactly when state = 'redacted'
    content_sha256 TEXT NOT NULL,   -- hex digest of the original content; immutable
    state          TEXT NOT NULL DEFAULT 'active' CHECK (state IN ('active', 'redacted')),
    created_at     TEXT NOT NULL,   -- ISO 8601 UTC, millisecond precision
    meta_json      TEXT
);

CREATE INDEX IF NOT EXISTS idx_inputs_sha256 ON inputs (content_sha256);
CREATE INDEX IF NOT EXISTS idx_inputs_state  ON inputs (state);

CREATE TABLE IF NOT EXISTS notes (
    note_id      TEXT PRIMARY KEY,
    created_at   TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    meta_json    TEXT
);

CREATE TABLE IF NOT EXISTS input_note_links (
    input_id   TEXT NOT NULL REFERENCES inputs (input_id),
    note_id    TEXT NOT NULL REFERENCES notes  (note_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (input_id, note_id)
);

CREATE INDEX IF NOT EXISTS idx_links_note  ON input_note_links (note_id);
CREATE INDEX IF NOT EXISTS idx_links_input ON input_note_links (input_id);

-- The journal is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    event_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    timestamp  TEXT NOT NULL,
    payload    TEXT NOT NULL    -- JSON, event-specific
);

CREATE INDEX IF NOT EXISTS idx_events_type ON events (event_type);
CREATE INDEX IF NOT EXISTS idx_events_ts   ON events (timestamp);
";
