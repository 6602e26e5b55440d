//! [`LinkStore`] — the provenance relation between inputs and notes.
//!
//! Owns link rows only as a relation over entities it does not own; it
//! validates endpoint existence against the input and note tables but
//! never mutates them. The reconciliation queries (orphaned inputs) also
//! live here, since they are derived from the link relation.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use trove_core::{
  EventType, Input, Link, Note,
  time::{encode_timestamp, now_millis},
};

use crate::{
  Error, Result,
  encode::{RawInput, RawLink, RawNote},
  event::append_event,
  store::Store,
};

pub struct LinkStore {
  store: Store,
}

enum AddOutcome {
  MissingInput,
  MissingNote,
  Exists(RawLink),
  Created,
}

impl LinkStore {
  pub fn new(store: Store) -> Self {
    Self { store }
  }

  /// Link an input to a note. Both endpoints must exist — the input is
  /// checked first. An existing pair is an idempotent no-op (`created =
  /// false`, no event); validation, presence check, insert, and event all
  /// run in one transaction, so a failed add never leaves a link row.
  pub async fn add(
    &self,
    input_id: &str,
    note_id: &str,
  ) -> Result<(Link, bool)> {
    let now = now_millis();
    let now_str = encode_timestamp(now);
    let iid = input_id.to_owned();
    let nid = note_id.to_owned();

    let outcome = self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let input_exists = tx
          .query_row(
            "SELECT 1 FROM inputs WHERE input_id = ?1",
            rusqlite::params![iid],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !input_exists {
          return Ok(AddOutcome::MissingInput);
        }

        let note_exists = tx
          .query_row(
            "SELECT 1 FROM notes WHERE note_id = ?1",
            rusqlite::params![nid],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !note_exists {
          return Ok(AddOutcome::MissingNote);
        }

        let existing = tx
          .query_row(
            "SELECT input_id, note_id, created_at
             FROM input_note_links WHERE input_id = ?1 AND note_id = ?2",
            rusqlite::params![iid, nid],
            RawLink::from_row,
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok(AddOutcome::Exists(raw));
        }

        tx.execute(
          "INSERT INTO input_note_links (input_id, note_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![iid, nid, now_str],
        )?;

        append_event(
          &tx,
          EventType::LinkAdded,
          &serde_json::json!({ "input_id": iid, "note_id": nid }),
          &now_str,
        )?;

        tx.commit()?;
        Ok(AddOutcome::Created)
      })
      .await?;

    match outcome {
      AddOutcome::MissingInput => {
        Err(Error::InputNotFound(input_id.to_owned()))
      }
      AddOutcome::MissingNote => Err(Error::NoteNotFound(note_id.to_owned())),
      AddOutcome::Exists(raw) => Ok((raw.into_link()?, false)),
      AddOutcome::Created => Ok((
        Link {
          input_id:   input_id.to_owned(),
          note_id:    note_id.to_owned(),
          created_at: now,
        },
        true,
      )),
    }
  }

  /// Remove the link if present; returns whether a row was deleted.
  /// No endpoint validation — removing a link to an already-deleted
  /// entity must still succeed. `LINK_REMOVED` only when something was
  /// actually removed.
  pub async fn remove(&self, input_id: &str, note_id: &str) -> Result<bool> {
    let now_str = encode_timestamp(Utc::now());
    let iid = input_id.to_owned();
    let nid = note_id.to_owned();

    self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let deleted = tx.execute(
          "DELETE FROM input_note_links WHERE input_id = ?1 AND note_id = ?2",
          rusqlite::params![iid, nid],
        )?;

        if deleted == 0 {
          return Ok(false);
        }

        append_event(
          &tx,
          EventType::LinkRemoved,
          &serde_json::json!({ "input_id": iid, "note_id": nid }),
          &now_str,
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await
  }

  /// All inputs linked to a note, ascending by link `created_at`.
  /// Redacted inputs are included (content `None`) — redaction never
  /// hides provenance.
  pub async fn sources_for_note(&self, note_id: &str) -> Result<Vec<Input>> {
    let nid = note_id.to_owned();

    let raws: Vec<RawInput> = self
      .store
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT i.input_id, i.content, i.content_sha256, i.state, i.created_at, i.meta_json
           FROM inputs i
           JOIN input_note_links l ON i.input_id = l.input_id
           WHERE l.note_id = ?1
           ORDER BY l.created_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![nid], RawInput::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInput::into_input).collect()
  }

  /// All notes linked to an input, ascending by link `created_at`.
  pub async fn notes_for_input(&self, input_id: &str) -> Result<Vec<Note>> {
    let iid = input_id.to_owned();

    let raws: Vec<RawNote> = self
      .store
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT n.note_id, n.created_at, n.last_seen_at, n.meta_json
           FROM notes n
           JOIN input_note_links l ON n.note_id = l.note_id
           WHERE l.input_id = ?1
           ORDER BY l.created_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![iid], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  /// Inputs with zero rows in the link relation, ascending by
  /// `created_at`. Reflects current state only: an input whose links were
  /// all removed is orphaned again.
  pub async fn find_orphaned_inputs(&self) -> Result<Vec<Input>> {
    let raws: Vec<RawInput> = self
      .store
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT i.input_id, i.content, i.content_sha256, i.state, i.created_at, i.meta_json
           FROM inputs i
           LEFT JOIN input_note_links l ON i.input_id = l.input_id
           WHERE l.note_id IS NULL
           ORDER BY i.created_at ASC",
        )?;
        let rows = stmt
          .query_map([], RawInput::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInput::into_input).collect()
  }
}
