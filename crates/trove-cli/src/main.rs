//! `trove` — command-line boundary layer for the provenance ledger.
//!
//! Every subcommand maps to one ledger operation and prints its result as
//! pretty JSON on stdout; diagnostics go to stderr via `tracing`. The
//! binary owns everything the ledger core deliberately does not: id
//! generation, file/stdin reading, limit caps, and JSON shaping.
//!
//! # Usage
//!
//! ```
//! trove --db vault.db init
//! trove --db vault.db store-input --file transcript.txt --meta '{"source":"youtube"}'
//! trove --db vault.db link <input-id> <note-id>
//! trove --db vault.db orphans
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trove", version, about = "Provenance ledger for vault documents")]
struct Cli {
  /// Path to the SQLite ledger file.
  #[arg(long, env = "TROVE_DB", default_value = "trove.db")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
  Active,
  Redacted,
}

#[derive(Subcommand)]
enum Command {
  /// Create the database schema. Fails if already initialized.
  Init,
  /// Report whether the ledger is initialized, plus row counts.
  Status,
  /// Generate a UUIDv7 note id and the frontmatter snippet to embed.
  ///
  /// Does not register the note — run `register-note` once the id has
  /// been injected into the document.
  GenId,
  /// Store raw source content, deduplicated on its SHA-256.
  StoreInput {
    /// Read content from this file instead of stdin.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Caller-supplied input id; a UUIDv7 is generated when omitted.
    #[arg(long)]
    id:   Option<String>,
    /// Metadata as a JSON object.
    #[arg(long)]
    meta: Option<String>,
  },
  /// Fetch one input by id.
  GetInput { id: String },
  /// List inputs, ascending by creation time.
  ListInputs {
    #[arg(long)]
    state:  Option<StateArg>,
    #[arg(long)]
    limit:  Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
  },
  /// Null an input's content, keeping its hash, metadata, and links.
  Redact { id: String },
  /// Register a note sighting (creates the note on first call).
  RegisterNote {
    id:   String,
    /// Metadata as a JSON object; replaces prior metadata when given.
    #[arg(long)]
    meta: Option<String>,
  },
  /// Fetch one note by id.
  GetNote { id: String },
  /// Tombstone a note in its metadata; the row is kept for audit.
  MarkDeleted { id: String },
  /// Add a provenance link between an input and a note.
  Link { input_id: String, note_id: String },
  /// Remove a provenance link.
  Unlink { input_id: String, note_id: String },
  /// All inputs linked to a note (redacted ones included).
  Sources { note_id: String },
  /// All notes linked to an input.
  NotesFor { input_id: String },
  /// Inputs with no current links to any note.
  Orphans,
  /// Notes with no current links to any input.
  Unlinked,
  /// Notes not seen since the given RFC 3339 threshold.
  Stale { not_seen_since: String },
  /// Query the append-only event journal.
  Events {
    /// Filter by event type, e.g. INPUT_STORED.
    #[arg(long, value_name = "TYPE")]
    event_type: Option<String>,
    /// Inclusive RFC 3339 lower bound on the event timestamp.
    #[arg(long)]
    since:      Option<String>,
    #[arg(long)]
    limit:      Option<usize>,
    #[arg(long)]
    offset:     Option<usize>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  commands::run(cli).await
}
