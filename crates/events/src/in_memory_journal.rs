//! In-memory journal for tests/dev.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::journal::{JournalEntry, JournalError, JournalRecord, JournalSink};

/// In-memory append-only journal.
///
/// - No IO / no async
/// - Sequence numbers are gap-free and start at 1
/// - Appends can be switched to fail, to exercise error propagation
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    records: Mutex<Vec<JournalRecord>>,
    reject_appends: AtomicBool,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail (or succeed again).
    pub fn reject_appends(&self, reject: bool) {
        self.reject_appends.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of all recorded entries, in append order.
    pub fn records(&self) -> Vec<JournalRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.records().into_iter().map(|r| r.entry).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JournalSink for InMemoryJournal {
    fn record_all(&self, entries: Vec<JournalEntry>) -> Result<(), JournalError> {
        if self.reject_appends.load(Ordering::SeqCst) {
            tracing::warn!(batch = entries.len(), "journal append rejected");
            return Err(JournalError::Rejected("journal is read-only".to_string()));
        }

        let mut records = self.records.lock().map_err(|_| JournalError::Poisoned)?;
        let mut next = records.last().map(|r| r.sequence_number).unwrap_or(0) + 1;
        for entry in entries {
            records.push(JournalRecord::new(next, entry));
            next += 1;
        }
        Ok(())
    }
}
