//! [`InputStore`] — content-addressable storage for raw source artifacts.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use trove_core::{
  Input, InputQuery, InputState, Meta, content_sha256,
  meta::encode_meta,
  time::{encode_timestamp, now_millis},
};

use crate::{
  Error, Result,
  encode::{RawInput, encode_state},
  event::append_event,
  store::Store,
};

pub struct InputStore {
  store: Store,
}

/// Decision made inside the dedup transaction.
enum StoreOutcome {
  Duplicate(RawInput),
  Created,
}

enum RedactOutcome {
  Missing,
  Redacted(RawInput),
}

impl InputStore {
  pub fn new(store: Store) -> Self {
    Self { store }
  }

  /// Store `content` under `input_id`, deduplicating on the content hash.
  ///
  /// If an *active* input with the same SHA-256 already exists it is
  /// returned unchanged with `duplicate = true` — no write, no event.
  /// Otherwise a new active row is inserted and `INPUT_STORED` appended.
  /// The dedup check and the insert are one transaction, so two callers
  /// can never both create an active input for the same hash.
  pub async fn store(
    &self,
    input_id: &str,
    content: &str,
    meta: Option<Meta>,
  ) -> Result<(Input, bool)> {
    if content.is_empty() {
      return Err(Error::EmptyContent);
    }

    let sha256 = content_sha256(content);
    let now = now_millis();
    let now_str = encode_timestamp(now);
    let meta_json = encode_meta(meta.as_ref())?;

    let id = input_id.to_owned();
    let content_owned = content.to_owned();
    let sha = sha256.clone();

    let outcome = self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            "SELECT input_id, content, content_sha256, state, created_at, meta_json
             FROM inputs WHERE content_sha256 = ?1 AND state = 'active'",
            rusqlite::params![sha],
            RawInput::from_row,
          )
          .optional()?;

        if let Some(raw) = existing {
          // Nothing was written; dropping the transaction rolls it back.
          return Ok(StoreOutcome::Duplicate(raw));
        }

        tx.execute(
          "INSERT INTO inputs (input_id, content, content_sha256, state, created_at, meta_json)
           VALUES (?1, ?2, ?3, 'active', ?4, ?5)",
          rusqlite::params![id, content_owned, sha, now_str, meta_json],
        )?;

        append_event(
          &tx,
          trove_core::EventType::InputStored,
          &serde_json::json!({ "input_id": id, "content_sha256": sha }),
          &now_str,
        )?;

        tx.commit()?;
        Ok(StoreOutcome::Created)
      })
      .await?;

    match outcome {
      StoreOutcome::Duplicate(raw) => Ok((raw.into_input()?, true)),
      StoreOutcome::Created => Ok((
        Input {
          input_id:       input_id.to_owned(),
          content:        Some(content.to_owned()),
          content_sha256: sha256,
          state:          InputState::Active,
          created_at:     now,
          meta,
        },
        false,
      )),
    }
  }

  pub async fn get(&self, input_id: &str) -> Result<Input> {
    let id = input_id.to_owned();

    let raw = self
      .store
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT input_id, content, content_sha256, state, created_at, meta_json
               FROM inputs WHERE input_id = ?1",
              rusqlite::params![id],
              RawInput::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_input(),
      None => Err(Error::InputNotFound(input_id.to_owned())),
    }
  }

  /// The active input with this content hash, if any. Redacted rows are
  /// outside the uniqueness rule and never returned here.
  pub async fn find_by_sha256(&self, sha256: &str) -> Result<Option<Input>> {
    let sha = sha256.to_owned();

    let raw = self
      .store
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT input_id, content, content_sha256, state, created_at, meta_json
               FROM inputs WHERE content_sha256 = ?1 AND state = 'active'",
              rusqlite::params![sha],
              RawInput::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInput::into_input).transpose()
  }

  /// Inputs matching `query`, ascending by `created_at`. `limit` defaults
  /// to 100.
  pub async fn list(&self, query: &InputQuery) -> Result<Vec<Input>> {
    let state_str = query.state.map(encode_state);
    let limit = query.limit.unwrap_or(100) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawInput> = self
      .store
      .call(move |conn| {
        let where_clause =
          if state_str.is_some() { "WHERE state = ?1" } else { "" };

        let sql = format!(
          "SELECT input_id, content, content_sha256, state, created_at, meta_json
           FROM inputs {where_clause}
           ORDER BY created_at ASC LIMIT ?2 OFFSET ?3"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![state_str, limit, offset],
            RawInput::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInput::into_input).collect()
  }

  /// Null the content and tombstone the row. One-way: there is no
  /// un-redact. Repeat calls succeed and append another `INPUT_REDACTED`
  /// event each time (the audit trail records every attempt).
  pub async fn redact(&self, input_id: &str) -> Result<Input> {
    let now_str = encode_timestamp(Utc::now());
    let id = input_id.to_owned();

    let outcome = self
      .store
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            "SELECT input_id, content, content_sha256, state, created_at, meta_json
             FROM inputs WHERE input_id = ?1",
            rusqlite::params![id],
            RawInput::from_row,
          )
          .optional()?;

        let Some(raw) = existing else {
          return Ok(RedactOutcome::Missing);
        };

        tx.execute(
          "UPDATE inputs SET content = NULL, state = 'redacted' WHERE input_id = ?1",
          rusqlite::params![id],
        )?;

        append_event(
          &tx,
          trove_core::EventType::InputRedacted,
          &serde_json::json!({ "input_id": id }),
          &now_str,
        )?;

        tx.commit()?;
        Ok(RedactOutcome::Redacted(raw))
      })
      .await?;

    match outcome {
      RedactOutcome::Missing => Err(Error::InputNotFound(input_id.to_owned())),
      RedactOutcome::Redacted(raw) => {
        let mut input = raw.into_input()?;
        input.content = None;
        input.state = InputState::Redacted;
        Ok(input)
      }
    }
  }
}
