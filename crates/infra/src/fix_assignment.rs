use std::collections::HashMap;
use std::sync::RwLock;

use stockyard_core::LocationId;
use stockyard_location::{FixAssignment, FixAssignmentLookup, TransferError, TransferResult};

/// Fixed item assignments, keyed by location in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryFixAssignments {
    assignments: RwLock<HashMap<LocationId, Vec<FixAssignment>>>,
}

impl InMemoryFixAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, assignment: FixAssignment) -> TransferResult<()> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| TransferError::Store("lock poisoned".to_string()))?;
        assignments
            .entry(assignment.location)
            .or_default()
            .push(assignment);
        Ok(())
    }

    /// Drop every assignment of `location`.
    pub fn release(&self, location: LocationId) -> TransferResult<()> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| TransferError::Store("lock poisoned".to_string()))?;
        assignments.remove(&location);
        Ok(())
    }
}

impl FixAssignmentLookup for InMemoryFixAssignments {
    fn first_assignment(&self, location: LocationId) -> TransferResult<Option<FixAssignment>> {
        let assignments = self
            .assignments
            .read()
            .map_err(|_| TransferError::Store("lock poisoned".to_string()))?;
        Ok(assignments
            .get(&location)
            .and_then(|list| list.first())
            .cloned())
    }
}
