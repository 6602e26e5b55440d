//! Subcommand handlers.
//!
//! This module enforces the boundary-layer side of the ledger contract:
//! content is read from a file or stdin, ids are generated here (UUIDv7,
//! time-sortable), caller-supplied limits are capped, `--meta` must be a
//! JSON object, and data commands refuse to run against an uninitialized
//! database.

use std::io::Read as _;

use anyhow::{Context as _, ensure};
use serde_json::json;
use trove_core::{
  EventQuery, EventType, InputQuery, InputState, Meta, time::decode_timestamp,
};
use trove_store_sqlite::{EventLog, InputStore, LinkStore, NoteStore, Store};
use uuid::Uuid;

use crate::{Cli, Command, StateArg};

/// Frontmatter key a vault agent injects into a document alongside a
/// generated note id.
const FRONTMATTER_KEY: &str = "trove_source_id";

/// Hard ceiling on caller-supplied limits. The repository default of 100
/// applies when no limit is given.
const MAX_LIMIT: usize = 500;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
  if matches!(cli.command, Command::GenId) {
    let note_id = Uuid::now_v7().to_string();
    return print_json(&json!({
      "note_id": note_id,
      "frontmatter_key": FRONTMATTER_KEY,
      "frontmatter_snippet": format!("{FRONTMATTER_KEY}: {note_id}"),
    }));
  }

  let path = cli.db.display().to_string();
  let store = Store::open(&cli.db)
    .await
    .with_context(|| format!("opening ledger at {path}"))?;
  tracing::debug!("opened ledger at {path}");

  // Everything except init/status operates on an existing schema.
  if !matches!(cli.command, Command::Init | Command::Status) {
    ensure!(
      store.is_initialized().await,
      "ledger at {path} is not initialized; run `trove init` first"
    );
  }

  match cli.command {
    // Handled before the store was opened.
    Command::GenId => Ok(()),

    Command::Init => {
      store.initialize().await.context("initializing ledger")?;
      print_json(&json!({ "initialized": true, "path": path }))
    }

    Command::Status => {
      if !store.is_initialized().await {
        return print_json(&json!({ "initialized": false, "path": path }));
      }
      let stats = store.stats().await?;
      print_json(&json!({ "initialized": true, "path": path, "stats": stats }))
    }

    Command::StoreInput { file, id, meta } => {
      let content = match file {
        Some(file) => std::fs::read_to_string(&file)
          .with_context(|| format!("reading {}", file.display()))?,
        None => {
          let mut buf = String::new();
          std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading content from stdin")?;
          buf
        }
      };
      ensure!(!content.is_empty(), "input content must not be empty");

      let meta = parse_meta(meta.as_deref())?;
      let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());

      let (input, duplicate) =
        InputStore::new(store.clone()).store(&id, &content, meta).await?;
      print_json(&json!({ "input": input, "duplicate": duplicate }))
    }

    Command::GetInput { id } => {
      let input = InputStore::new(store.clone()).get(&id).await?;
      print_json(&input)
    }

    Command::ListInputs { state, limit, offset } => {
      let query = InputQuery {
        state: state.map(InputState::from),
        limit: cap(limit),
        offset,
      };
      let inputs = InputStore::new(store.clone()).list(&query).await?;
      print_json(&inputs)
    }

    Command::Redact { id } => {
      let input = InputStore::new(store.clone()).redact(&id).await?;
      print_json(&input)
    }

    Command::RegisterNote { id, meta } => {
      let meta = parse_meta(meta.as_deref())?;
      let note = NoteStore::new(store.clone()).register(&id, meta).await?;
      print_json(&note)
    }

    Command::GetNote { id } => {
      let note = NoteStore::new(store.clone()).get(&id).await?;
      print_json(&note)
    }

    Command::MarkDeleted { id } => {
      NoteStore::new(store.clone()).mark_deleted(&id).await?;
      print_json(&json!({ "note_id": id, "marked_deleted": true }))
    }

    Command::Link { input_id, note_id } => {
      let (link, created) =
        LinkStore::new(store.clone()).add(&input_id, &note_id).await?;
      print_json(&json!({ "link": link, "created": created }))
    }

    Command::Unlink { input_id, note_id } => {
      let removed =
        LinkStore::new(store.clone()).remove(&input_id, &note_id).await?;
      print_json(&json!({ "removed": removed }))
    }

    Command::Sources { note_id } => {
      let sources =
        LinkStore::new(store.clone()).sources_for_note(&note_id).await?;
      print_json(&sources)
    }

    Command::NotesFor { input_id } => {
      let notes =
        LinkStore::new(store.clone()).notes_for_input(&input_id).await?;
      print_json(&notes)
    }

    Command::Orphans => {
      let orphans =
        LinkStore::new(store.clone()).find_orphaned_inputs().await?;
      print_json(&orphans)
    }

    Command::Unlinked => {
      let unlinked = NoteStore::new(store.clone()).find_unlinked().await?;
      print_json(&unlinked)
    }

    Command::Stale { not_seen_since } => {
      let threshold = decode_timestamp(&not_seen_since)
        .context("parsing the not-seen-since threshold")?;
      let stale = NoteStore::new(store.clone()).find_stale(threshold).await?;
      print_json(&stale)
    }

    Command::Events { event_type, since, limit, offset } => {
      let query = EventQuery {
        event_type: event_type
          .as_deref()
          .map(EventType::parse)
          .transpose()
          .context("parsing --event-type")?,
        since:      since
          .as_deref()
          .map(decode_timestamp)
          .transpose()
          .context("parsing --since")?,
        limit:      cap(limit),
        offset,
      };
      let events = EventLog::new(store.clone()).query(&query).await?;
      print_json(&events)
    }
  }
}

impl From<StateArg> for InputState {
  fn from(state: StateArg) -> Self {
    match state {
      StateArg::Active => InputState::Active,
      StateArg::Redacted => InputState::Redacted,
    }
  }
}

fn parse_meta(raw: Option<&str>) -> anyhow::Result<Option<Meta>> {
  let Some(raw) = raw else {
    return Ok(None);
  };
  let value: serde_json::Value =
    serde_json::from_str(raw).context("parsing --meta")?;
  match value {
    serde_json::Value::Object(map) => Ok(Some(map)),
    _ => anyhow::bail!("--meta must be a JSON object"),
  }
}

fn cap(limit: Option<usize>) -> Option<usize> {
  limit.map(|l| l.min(MAX_LIMIT))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
