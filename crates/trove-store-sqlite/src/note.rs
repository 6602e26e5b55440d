//! [`NoteStore`] — first/last-seen tracking for derived documents.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use trove_core::{
  EventType, Meta, Note,
  meta::{encode_meta, merge_tombstone},
  time::{encode_timestamp, now_millis},
};

use crate::{
  Error, Result, encode::RawNote, event::append_event, store::Store,
};

pub struct NoteStore {
  store: Store,
}

enum RegisterOutcome {
  FirstSeen,
  SeenAgain(RawNote),
}

enum MarkOutcome {
  Missing,
  Done,
  /// Stored meta blob that failed to parse or re-serialise; the
  /// transaction was rolled back.
  BadMeta(serde_json::Error),
}

impl NoteStore {
  pub fn new(store: Store) -> Self {
    Self { store }
  }

  /// Record that a note was observed. Safe to call on every sighting:
  /// the first call creates the row, every later call bumps
  /// `last_seen_at` and replaces meta only when a new one is supplied.
  /// Appends `NOTE_SEEN` either way (`first_seen: true` on creation).
  pub async fn register(
    &self,
    note_id: &str,
    meta: Option<Meta>,
  ) -> Result<Note> {
    let now = now_millis();
    let now_str = encode_timestamp(now);
    let meta_json = encode_meta(meta.as_ref())?;
    let id = note_id.to_owned();

    let outcome = self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            "SELECT note_id, created_at, last_seen_at, meta_json
             FROM notes WHERE note_id = ?1",
            rusqlite::params![id],
            RawNote::from_row,
          )
          .optional()?;

        match existing {
          Some(raw) => {
            tx.execute(
              "UPDATE notes SET last_seen_at = ?1, meta_json = COALESCE(?2, meta_json)
               WHERE note_id = ?3",
              rusqlite::params![now_str, meta_json, id],
            )?;

            append_event(
              &tx,
              EventType::NoteSeen,
              &serde_json::json!({ "note_id": id }),
              &now_str,
            )?;

            tx.commit()?;
            Ok(RegisterOutcome::SeenAgain(raw))
          }
          None => {
            tx.execute(
              "INSERT INTO notes (note_id, created_at, last_seen_at, meta_json)
               VALUES (?1, ?2, ?2, ?3)",
              rusqlite::params![id, now_str, meta_json],
            )?;

            append_event(
              &tx,
              EventType::NoteSeen,
              &serde_json::json!({ "note_id": id, "first_seen": true }),
              &now_str,
            )?;

            tx.commit()?;
            Ok(RegisterOutcome::FirstSeen)
          }
        }
      })
      .await?;

    match outcome {
      RegisterOutcome::FirstSeen => Ok(Note {
        note_id: note_id.to_owned(),
        created_at: now,
        last_seen_at: now,
        meta,
      }),
      RegisterOutcome::SeenAgain(raw) => {
        let prior = raw.into_note()?;
        Ok(Note {
          note_id:      prior.note_id,
          created_at:   prior.created_at,
          last_seen_at: now,
          meta:         meta.or(prior.meta),
        })
      }
    }
  }

  pub async fn get(&self, note_id: &str) -> Result<Note> {
    self
      .find(note_id)
      .await?
      .ok_or_else(|| Error::NoteNotFound(note_id.to_owned()))
  }

  pub async fn find(&self, note_id: &str) -> Result<Option<Note>> {
    let id = note_id.to_owned();

    let raw = self
      .store
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT note_id, created_at, last_seen_at, meta_json
               FROM notes WHERE note_id = ?1",
              rusqlite::params![id],
              RawNote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNote::into_note).transpose()
  }

  /// Merge the deletion tombstone into the note's meta. The row is
  /// retained for audit; there is no hard delete.
  pub async fn mark_deleted(&self, note_id: &str) -> Result<()> {
    let now = Utc::now();
    let now_str = encode_timestamp(now);
    let id = note_id.to_owned();

    let outcome = self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<Option<String>> = tx
          .query_row(
            "SELECT meta_json FROM notes WHERE note_id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
          )
          .optional()?;

        let Some(meta_json) = existing else {
          return Ok(MarkOutcome::Missing);
        };

        let prior = match meta_json
          .as_deref()
          .map(serde_json::from_str::<Meta>)
          .transpose()
        {
          Ok(m) => m,
          Err(e) => return Ok(MarkOutcome::BadMeta(e)),
        };

        let merged = merge_tombstone(prior, now);
        let updated = match serde_json::to_string(&merged) {
          Ok(s) => s,
          Err(e) => return Ok(MarkOutcome::BadMeta(e)),
        };

        tx.execute(
          "UPDATE notes SET meta_json = ?1 WHERE note_id = ?2",
          rusqlite::params![updated, id],
        )?;

        append_event(
          &tx,
          EventType::NoteMarkedDeleted,
          &serde_json::json!({ "note_id": id }),
          &now_str,
        )?;

        tx.commit()?;
        Ok(MarkOutcome::Done)
      })
      .await?;

    match outcome {
      MarkOutcome::Missing => Err(Error::NoteNotFound(note_id.to_owned())),
      MarkOutcome::BadMeta(e) => Err(Error::Json(e)),
      MarkOutcome::Done => Ok(()),
    }
  }

  /// Notes whose `last_seen_at` predates `threshold`, ascending by
  /// `last_seen_at`.
  pub async fn find_stale(
    &self,
    threshold: DateTime<Utc>,
  ) -> Result<Vec<Note>> {
    let threshold_str = encode_timestamp(threshold);

    let raws: Vec<RawNote> = self
      .store
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT note_id, created_at, last_seen_at, meta_json
           FROM notes WHERE last_seen_at < ?1
           ORDER BY last_seen_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![threshold_str], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  /// Notes with zero rows in the link relation, ascending by `created_at`.
  pub async fn find_unlinked(&self) -> Result<Vec<Note>> {
    let raws: Vec<RawNote> = self
      .store
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT n.note_id, n.created_at, n.last_seen_at, n.meta_json
           FROM notes n
           LEFT JOIN input_note_links l ON n.note_id = l.note_id
           WHERE l.input_id IS NULL
           ORDER BY n.created_at ASC",
        )?;
        let rows = stmt
          .query_map([], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }
}
