//! Core types for the trove provenance ledger.
//!
//! This crate is deliberately free of database dependencies. It defines the
//! entities (inputs, notes, links, events), the metadata map and its
//! tombstone merge, the canonical timestamp representation, and the
//! pure-domain error type. The storage layer lives in `trove-store-sqlite`.

pub mod error;
pub mod event;
pub mod input;
pub mod link;
pub mod meta;
pub mod note;
pub mod query;
pub mod time;

pub use error::{Error, Result};
pub use event::{Event, EventType};
pub use input::{Input, InputState, content_sha256};
pub use link::Link;
pub use meta::Meta;
pub use note::Note;
pub use query::{EventQuery, InputQuery, Stats};
