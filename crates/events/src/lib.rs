//! Warehouse journal events and the append-only journal boundary.

pub mod event;
pub mod in_memory_journal;
pub mod journal;

pub use event::Event;
pub use in_memory_journal::InMemoryJournal;
pub use journal::{JournalEntry, JournalError, JournalRecord, JournalSink};
