//! Journal contract for unit-load relocations.
//!
//! One [`JournalEntry`] is written per unit load touched by a transfer: the
//! moved root itself plus every descendant rebased by carrier propagation.
//! Entries are facts. Sinks append them and never mutate or retry them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use stockyard_core::{LocationId, UnitLoadId, UserId};

use crate::Event;

/// Event: a unit load changed its storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    /// The unit load whose location changed.
    pub moved: UnitLoadId,
    /// Label of the moved unit load at the time of the move.
    pub moved_label: String,
    /// The top-level unit load the operation was invoked on.
    pub root: UnitLoadId,
    pub source: LocationId,
    pub destination: LocationId,
    pub activity_code: String,
    pub actor: UserId,
    pub comment: String,
    pub occurred_at: DateTime<Utc>,
}

impl Event for JournalEntry {
    const EVENT_TYPE: &'static str = "inventory.unit_load.transferred";
    const VERSION: u32 = 1;

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// A journal entry as persisted by a sink (assigned a sequence number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Monotonically increasing position in the journal, starting at 1.
    pub sequence_number: u64,
    pub event_type: String,
    pub event_version: u32,
    pub entry: JournalEntry,
}

impl JournalRecord {
    pub fn new(sequence_number: u64, entry: JournalEntry) -> Self {
        Self {
            sequence_number,
            event_type: entry.event_type().to_string(),
            event_version: entry.version(),
            entry,
        }
    }

    /// Serialize the record for an external audit export.
    pub fn to_json(&self) -> Result<JsonValue, JournalError> {
        serde_json::to_value(self)
            .map_err(|e| JournalError::Serialization(format!("journal record: {e}")))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("journal rejected append: {0}")]
    Rejected(String),

    #[error("journal serialization failed: {0}")]
    Serialization(String),

    /// Append failed due to internal lock poisoning.
    #[error("journal lock poisoned")]
    Poisoned,
}

/// Append-only sink for relocation journal entries.
///
/// `record_all` must be all-or-nothing: either every entry of the batch is
/// appended (in order) or none is and an error is returned. Dropping entries
/// silently is not allowed; failures are surfaced to the transfer that
/// produced them.
pub trait JournalSink: Send + Sync {
    fn record_all(&self, entries: Vec<JournalEntry>) -> Result<(), JournalError>;

    fn record(&self, entry: JournalEntry) -> Result<(), JournalError> {
        self.record_all(vec![entry])
    }
}

impl<S> JournalSink for Arc<S>
where
    S: JournalSink + ?Sized,
{
    fn record_all(&self, entries: Vec<JournalEntry>) -> Result<(), JournalError> {
        (**self).record_all(entries)
    }
}
