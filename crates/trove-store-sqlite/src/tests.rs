//! Integration tests for the SQLite ledger against in-memory databases.

use chrono::Duration;
use trove_core::{Event, EventQuery, EventType, InputQuery, InputState, Meta};

use crate::{Error, EventLog, InputStore, LinkStore, NoteStore, Store};

async fn store() -> Store {
  let s = Store::open_in_memory().await.expect("in-memory store");
  s.initialize().await.expect("initialize");
  s
}

fn meta(pairs: &[(&str, &str)]) -> Meta {
  pairs
    .iter()
    .map(|(k, v)| ((*k).to_owned(), serde_json::Value::from(*v)))
    .collect()
}

async fn events_of(s: &Store, event_type: EventType) -> Vec<Event> {
  EventLog::new(s.clone())
    .query(&EventQuery { event_type: Some(event_type), ..Default::default() })
    .await
    .unwrap()
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn is_initialized_tracks_schema_presence() {
  let s = Store::open_in_memory().await.unwrap();
  assert!(!s.is_initialized().await);

  s.initialize().await.unwrap();
  assert!(s.is_initialized().await);
}

#[tokio::test]
async fn initialize_twice_errors() {
  let s = store().await;
  let err = s.initialize().await.unwrap_err();
  assert!(matches!(err, Error::AlreadyInitialized));
}

#[tokio::test]
async fn initialize_appends_db_initialized_event() {
  let s = store().await;
  let events = events_of(&s, EventType::DbInitialized).await;
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].event_id, 1);
  assert!(events[0].payload["initialized_at"].is_string());
}

#[tokio::test]
async fn operations_after_close_fail_with_not_open() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  s.close().await.unwrap();

  let err = inputs.get("anything").await.unwrap_err();
  assert!(matches!(err, Error::NotOpen));

  // The probe never errors; it reports false for a closed store.
  assert!(!s.is_initialized().await);

  let err = s.close().await.unwrap_err();
  assert!(matches!(err, Error::NotOpen));
}

#[tokio::test]
async fn stats_counts_all_tables() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "alpha", None).await.unwrap();
  inputs.store("i2", "beta", None).await.unwrap();
  notes.register("n1", None).await.unwrap();
  links.add("i1", "n1").await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.inputs, 2);
  assert_eq!(stats.notes, 1);
  assert_eq!(stats.links, 1);
  // DB_INITIALIZED + 2x INPUT_STORED + NOTE_SEEN + LINK_ADDED
  assert_eq!(stats.events, 5);
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_and_get_roundtrip() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let (stored, duplicate) = inputs
    .store("i1", "some raw text", Some(meta(&[("source", "youtube")])))
    .await
    .unwrap();
  assert!(!duplicate);
  assert_eq!(stored.state, InputState::Active);
  assert_eq!(
    stored.content_sha256,
    trove_core::content_sha256("some raw text")
  );

  let fetched = inputs.get("i1").await.unwrap();
  assert_eq!(fetched.input_id, "i1");
  assert_eq!(fetched.content.as_deref(), Some("some raw text"));
  assert_eq!(fetched.content_sha256, stored.content_sha256);
  assert_eq!(fetched.created_at, stored.created_at);
  assert_eq!(fetched.meta.unwrap()["source"], "youtube");
}

#[tokio::test]
async fn store_rejects_empty_content() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let err = inputs.store("i1", "", None).await.unwrap_err();
  assert!(matches!(err, Error::EmptyContent));
  assert_eq!(s.stats().await.unwrap().inputs, 0);
}

#[tokio::test]
async fn storing_identical_content_twice_deduplicates() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let (first, dup1) = inputs.store("i1", "same text", None).await.unwrap();
  let (second, dup2) = inputs.store("i2", "same text", None).await.unwrap();

  assert!(!dup1);
  assert!(dup2);
  // The duplicate call resolves to the original row; "i2" is never used.
  assert_eq!(second.input_id, first.input_id);
  assert_eq!(s.stats().await.unwrap().inputs, 1);

  // The duplicate hit is a pure read: one INPUT_STORED event only.
  assert_eq!(events_of(&s, EventType::InputStored).await.len(), 1);
}

#[tokio::test]
async fn get_missing_input_errors() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let err = inputs.get("nope").await.unwrap_err();
  assert!(matches!(err, Error::InputNotFound(id) if id == "nope"));
}

#[tokio::test]
async fn find_by_sha256_sees_active_rows_only() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  inputs.store("i1", "findable", None).await.unwrap();
  let sha = trove_core::content_sha256("findable");

  assert!(inputs.find_by_sha256(&sha).await.unwrap().is_some());

  inputs.redact("i1").await.unwrap();
  assert!(inputs.find_by_sha256(&sha).await.unwrap().is_none());
}

#[tokio::test]
async fn list_filters_by_state_and_paginates() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  inputs.store("i1", "one", None).await.unwrap();
  inputs.store("i2", "two", None).await.unwrap();
  inputs.store("i3", "three", None).await.unwrap();
  inputs.redact("i2").await.unwrap();

  let active = inputs
    .list(&InputQuery { state: Some(InputState::Active), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(active.len(), 2);
  assert!(active.iter().all(|i| i.state == InputState::Active));

  let all = inputs.list(&InputQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  // Ascending by created_at == insertion order here.
  assert_eq!(all[0].input_id, "i1");
  assert_eq!(all[2].input_id, "i3");

  let page = inputs
    .list(&InputQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].input_id, "i2");
}

#[tokio::test]
async fn redact_nulls_content_and_tombstones_state() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let (stored, _) = inputs
    .store("i1", "secret", Some(meta(&[("source", "email")])))
    .await
    .unwrap();
  let redacted = inputs.redact("i1").await.unwrap();

  assert_eq!(redacted.state, InputState::Redacted);
  assert!(redacted.content.is_none());
  // The digest and metadata survive redaction.
  assert_eq!(redacted.content_sha256, stored.content_sha256);
  assert_eq!(redacted.meta.unwrap()["source"], "email");

  let fetched = inputs.get("i1").await.unwrap();
  assert!(fetched.content.is_none());
  assert_eq!(fetched.state, InputState::Redacted);
}

#[tokio::test]
async fn redact_missing_input_errors() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  let err = inputs.redact("nope").await.unwrap_err();
  assert!(matches!(err, Error::InputNotFound(_)));
}

#[tokio::test]
async fn redact_twice_succeeds_and_appends_two_events() {
  // Design choice: redaction is idempotent in outcome but the journal
  // records every attempt, so a second call appends a second event.
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  inputs.store("i1", "secret", None).await.unwrap();
  inputs.redact("i1").await.unwrap();
  let again = inputs.redact("i1").await.unwrap();

  assert_eq!(again.state, InputState::Redacted);
  assert!(again.content.is_none());
  assert_eq!(events_of(&s, EventType::InputRedacted).await.len(), 2);
}

#[tokio::test]
async fn storing_after_redaction_creates_a_fresh_active_input() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());

  inputs.store("i1", "same text", None).await.unwrap();
  inputs.redact("i1").await.unwrap();

  // The redacted row is out of the uniqueness check; same content is
  // accepted again as a brand-new active input.
  let (fresh, duplicate) = inputs.store("i2", "same text", None).await.unwrap();
  assert!(!duplicate);
  assert_eq!(fresh.input_id, "i2");
  assert_eq!(fresh.state, InputState::Active);
  assert_eq!(s.stats().await.unwrap().inputs, 2);
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_then_bumps_last_seen() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  let first = notes.register("n1", None).await.unwrap();
  assert_eq!(first.created_at, first.last_seen_at);

  let second = notes.register("n1", None).await.unwrap();
  assert_eq!(second.created_at, first.created_at);
  assert!(second.last_seen_at >= first.last_seen_at);

  let events = events_of(&s, EventType::NoteSeen).await;
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].payload["first_seen"], true);
  assert!(events[1].payload.get("first_seen").is_none());
}

#[tokio::test]
async fn register_retains_meta_unless_replaced() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  notes
    .register("n1", Some(meta(&[("title", "Compost")])))
    .await
    .unwrap();

  // No meta supplied: the prior map is retained.
  let kept = notes.register("n1", None).await.unwrap();
  assert_eq!(kept.meta.as_ref().unwrap()["title"], "Compost");

  // New meta supplied: full replacement, not a merge.
  let replaced = notes
    .register("n1", Some(meta(&[("path", "garden/compost.md")])))
    .await
    .unwrap();
  let m = replaced.meta.unwrap();
  assert_eq!(m["path"], "garden/compost.md");
  assert!(m.get("title").is_none());

  let fetched = notes.get("n1").await.unwrap();
  assert_eq!(fetched.meta.unwrap()["path"], "garden/compost.md");
}

#[tokio::test]
async fn get_missing_note_errors_and_find_returns_none() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  assert!(notes.find("nope").await.unwrap().is_none());
  let err = notes.get("nope").await.unwrap_err();
  assert!(matches!(err, Error::NoteNotFound(id) if id == "nope"));
}

#[tokio::test]
async fn mark_deleted_merges_tombstone_and_keeps_the_row() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  notes
    .register("n1", Some(meta(&[("title", "Compost")])))
    .await
    .unwrap();
  notes.mark_deleted("n1").await.unwrap();

  let note = notes.get("n1").await.unwrap();
  let m = note.meta.unwrap();
  assert_eq!(m["title"], "Compost");
  assert_eq!(m["deleted"], true);
  assert!(m["deleted_at"].is_string());

  assert_eq!(events_of(&s, EventType::NoteMarkedDeleted).await.len(), 1);
}

#[tokio::test]
async fn mark_deleted_missing_note_errors() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  let err = notes.mark_deleted("nope").await.unwrap_err();
  assert!(matches!(err, Error::NoteNotFound(_)));
}

#[tokio::test]
async fn find_stale_uses_last_seen_threshold() {
  let s = store().await;
  let notes = NoteStore::new(s.clone());

  let n1 = notes.register("n1", None).await.unwrap();

  let stale =
    notes.find_stale(n1.last_seen_at + Duration::seconds(1)).await.unwrap();
  assert_eq!(stale.len(), 1);
  assert_eq!(stale[0].note_id, "n1");

  let fresh =
    notes.find_stale(n1.last_seen_at - Duration::seconds(1)).await.unwrap();
  assert!(fresh.is_empty());
}

#[tokio::test]
async fn find_unlinked_reflects_current_links() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();
  notes.register("n2", None).await.unwrap();

  links.add("i1", "n1").await.unwrap();

  let unlinked = notes.find_unlinked().await.unwrap();
  assert_eq!(unlinked.len(), 1);
  assert_eq!(unlinked[0].note_id, "n2");
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_link_is_idempotent() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();

  let (first, created1) = links.add("i1", "n1").await.unwrap();
  let (second, created2) = links.add("i1", "n1").await.unwrap();

  assert!(created1);
  assert!(!created2);
  assert_eq!(second.created_at, first.created_at);
  assert_eq!(s.stats().await.unwrap().links, 1);

  // The idempotent no-op appends no event.
  assert_eq!(events_of(&s, EventType::LinkAdded).await.len(), 1);
}

#[tokio::test]
async fn add_link_validates_endpoints_input_first() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  // Both missing: the input check fires first.
  let err = links.add("no-input", "no-note").await.unwrap_err();
  assert!(matches!(err, Error::InputNotFound(id) if id == "no-input"));

  inputs.store("i1", "source", None).await.unwrap();
  let err = links.add("i1", "no-note").await.unwrap_err();
  assert!(matches!(err, Error::NoteNotFound(id) if id == "no-note"));

  notes.register("n1", None).await.unwrap();
  let err = links.add("no-input", "n1").await.unwrap_err();
  assert!(matches!(err, Error::InputNotFound(_)));

  // No link row survives a failed add.
  assert_eq!(s.stats().await.unwrap().links, 0);
}

#[tokio::test]
async fn remove_link_reports_whether_anything_was_deleted() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();
  links.add("i1", "n1").await.unwrap();

  assert!(links.remove("i1", "n1").await.unwrap());
  assert!(!links.remove("i1", "n1").await.unwrap());

  // Removal needs no endpoint validation at all.
  assert!(!links.remove("ghost", "phantom").await.unwrap());

  assert_eq!(events_of(&s, EventType::LinkRemoved).await.len(), 1);
}

#[tokio::test]
async fn provenance_survives_redaction() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "the original source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();
  links.add("i1", "n1").await.unwrap();

  inputs.redact("i1").await.unwrap();

  let sources = links.sources_for_note("n1").await.unwrap();
  assert_eq!(sources.len(), 1);
  assert_eq!(sources[0].input_id, "i1");
  assert_eq!(sources[0].state, InputState::Redacted);
  assert!(sources[0].content.is_none());
}

#[tokio::test]
async fn notes_for_input_orders_by_link_creation() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();
  notes.register("n2", None).await.unwrap();

  links.add("i1", "n1").await.unwrap();
  links.add("i1", "n2").await.unwrap();

  let linked = links.notes_for_input("i1").await.unwrap();
  assert_eq!(linked.len(), 2);
  assert_eq!(linked[0].note_id, "n1");
  assert_eq!(linked[1].note_id, "n2");
}

#[tokio::test]
async fn orphan_detection_is_current_state_not_historical() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  inputs.store("i1", "source", None).await.unwrap();
  notes.register("n1", None).await.unwrap();

  // Never linked: orphaned.
  let orphans = links.find_orphaned_inputs().await.unwrap();
  assert_eq!(orphans.len(), 1);

  links.add("i1", "n1").await.unwrap();
  assert!(links.find_orphaned_inputs().await.unwrap().is_empty());

  // Fully unlinked again: reappears.
  links.remove("i1", "n1").await.unwrap();
  let orphans = links.find_orphaned_inputs().await.unwrap();
  assert_eq!(orphans.len(), 1);
  assert_eq!(orphans[0].input_id, "i1");
}

// ─── Event log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_query_events() {
  let s = store().await;
  let log = EventLog::new(s.clone());

  let appended = log
    .append(EventType::NotesMerged, serde_json::json!({ "from": "a", "into": "b" }))
    .await
    .unwrap();
  assert!(appended.event_id > 1); // id 1 is DB_INITIALIZED

  let events = log.query(&EventQuery::default()).await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].event_type, EventType::DbInitialized);
  assert_eq!(events[1].event_id, appended.event_id);
  assert_eq!(events[1].payload["from"], "a");
}

#[tokio::test]
async fn event_query_filters_since_inclusive() {
  let s = store().await;
  let log = EventLog::new(s.clone());

  let first = log.query(&EventQuery::default()).await.unwrap();
  let init_ts = first[0].timestamp;

  let all = log
    .query(&EventQuery { since: Some(init_ts), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.len(), 1);

  let none = log
    .query(&EventQuery {
      since: Some(init_ts + Duration::seconds(1)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn event_query_orders_and_paginates() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let log = EventLog::new(s.clone());

  inputs.store("i1", "one", None).await.unwrap();
  inputs.store("i2", "two", None).await.unwrap();
  inputs.store("i3", "three", None).await.unwrap();

  let stored = log
    .query(&EventQuery {
      event_type: Some(EventType::InputStored),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(stored.len(), 3);
  assert!(stored.windows(2).all(|w| w[0].event_id < w[1].event_id));

  let page = log
    .query(&EventQuery {
      event_type: Some(EventType::InputStored),
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].event_id, stored[1].event_id);
}

// ─── End-to-end scenario ─────────────────────────────────────────────────────

#[tokio::test]
async fn full_provenance_scenario() {
  let s = store().await;
  let inputs = InputStore::new(s.clone());
  let notes = NoteStore::new(s.clone());
  let links = LinkStore::new(s.clone());

  // Store a transcript with meta.
  let (a, dup) = inputs
    .store("A", "Composting basics...", Some(meta(&[("source", "youtube")])))
    .await
    .unwrap();
  assert!(!dup);

  // Same text under a different id resolves to A.
  let (resolved, dup) =
    inputs.store("B", "Composting basics...", None).await.unwrap();
  assert!(dup);
  assert_eq!(resolved.input_id, a.input_id);

  // Register a note and link it to A.
  notes.register("N1", None).await.unwrap();
  links.add("A", "N1").await.unwrap();
  let sources = links.sources_for_note("N1").await.unwrap();
  assert_eq!(sources.len(), 1);
  assert_eq!(sources[0].input_id, "A");

  // Unlink: A becomes orphaned.
  links.remove("A", "N1").await.unwrap();
  let orphans = links.find_orphaned_inputs().await.unwrap();
  assert_eq!(orphans.len(), 1);
  assert_eq!(orphans[0].input_id, "A");

  // Redact A.
  inputs.redact("A").await.unwrap();
  let a = inputs.get("A").await.unwrap();
  assert!(a.content.is_none());
  assert_eq!(a.state, InputState::Redacted);
}
