//! SQLite backend for the trove provenance ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. [`Store`] owns the schema and
//! connection lifecycle; the four repository components ([`EventLog`],
//! [`InputStore`], [`NoteStore`], [`LinkStore`]) are each constructed with
//! a cheap clone of the store handle. Every read-then-write decision runs
//! inside a single explicit transaction, with the matching journal event
//! appended in the same transaction.

mod encode;
mod event;
mod input;
mod link;
mod note;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use event::EventLog;
pub use input::InputStore;
pub use link::LinkStore;
pub use note::NoteStore;
pub use store::Store;

#[cfg(test)]
mod tests;
