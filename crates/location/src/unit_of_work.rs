//! Logical transaction for one transfer operation.
//!
//! A [`UnitOfWork`] reads through to committed records and overlays its own
//! staged writes, so hierarchy queries made halfway through an operation see
//! the operation's own changes. Side effects (reservations, journal entries,
//! placement notices) are buffered next to the writes and only leave the
//! unit of work as one [`Changeset`]. Data anomalies found on the way are
//! held back as well and only reported once the changeset is committed.

use std::collections::{BTreeMap, BTreeSet};

use stockyard_core::{Entity, LocationId, UnitLoadId, Versioned};
use stockyard_events::JournalEntry;

use crate::error::{TransferError, TransferResult};
use crate::model::{StorageLocation, UnitLoad};
use crate::ports::{DataAnomaly, WarehouseSnapshot};

/// A buffered call into the reservation manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReservationOp {
    Allocate {
        location: LocationId,
        unit_load: UnitLoadId,
    },
    Deallocate {
        location: LocationId,
        unit_load: UnitLoadId,
    },
    DeallocateComplete {
        location: LocationId,
    },
}

/// A buffered placement hook notification, delivered by the store during commit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlacementNotice {
    Removed {
        location: LocationId,
        unit_load: UnitLoadId,
    },
    Placed {
        location: LocationId,
        unit_load: UnitLoadId,
    },
}

/// Everything a store has to apply atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Modified unit loads; each carries the version it was read at.
    pub unit_loads: Vec<UnitLoad>,
    /// Locations the operation depends on, with the version they were read at.
    pub locations: Vec<(LocationId, u64)>,
    pub reservations: Vec<ReservationOp>,
    pub notices: Vec<PlacementNotice>,
    pub journal: Vec<JournalEntry>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.unit_loads.is_empty()
            && self.locations.is_empty()
            && self.reservations.is_empty()
            && self.notices.is_empty()
            && self.journal.is_empty()
    }
}

pub struct UnitOfWork<'a, S: ?Sized> {
    snapshot: &'a S,
    max_carrier_depth: usize,
    staged: BTreeMap<UnitLoadId, UnitLoad>,
    touched_locations: BTreeMap<LocationId, u64>,
    reservations: Vec<ReservationOp>,
    journal: Vec<JournalEntry>,
    notices: Vec<PlacementNotice>,
    anomalies: Vec<DataAnomaly>,
}

impl<'a, S> UnitOfWork<'a, S>
where
    S: WarehouseSnapshot + ?Sized,
{
    pub fn new(snapshot: &'a S, max_carrier_depth: usize) -> Self {
        Self {
            snapshot,
            max_carrier_depth,
            staged: BTreeMap::new(),
            touched_locations: BTreeMap::new(),
            reservations: Vec::new(),
            journal: Vec::new(),
            notices: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn max_carrier_depth(&self) -> usize {
        self.max_carrier_depth
    }

    pub fn find_unit_load(&self, id: UnitLoadId) -> TransferResult<Option<UnitLoad>> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(Some(staged.clone()));
        }
        self.snapshot.find_unit_load(id)
    }

    pub fn unit_load(&self, id: UnitLoadId) -> TransferResult<UnitLoad> {
        self.find_unit_load(id)?
            .ok_or(TransferError::UnitLoadNotFound(id))
    }

    pub fn location(&self, id: LocationId) -> TransferResult<StorageLocation> {
        self.snapshot
            .find_location(id)?
            .ok_or(TransferError::LocationNotFound(id))
    }

    /// Direct children of `carrier`, as of now (staged writes included).
    pub fn children(&self, carrier: UnitLoadId) -> TransferResult<Vec<UnitLoad>> {
        let mut children = Vec::new();
        let mut seen = BTreeSet::new();

        for committed in self.snapshot.unit_loads_carried_by(carrier)? {
            let id = committed.id();
            seen.insert(id);
            let current = self.staged.get(&id).cloned().unwrap_or(committed);
            if current.carrier_id() == Some(carrier) {
                children.push(current);
            }
        }

        // Loads that became children during this unit of work.
        for staged in self.staged.values() {
            if staged.carrier_id() == Some(carrier) && !seen.contains(&staged.id()) {
                children.push(staged.clone());
            }
        }

        Ok(children)
    }

    /// True when any unit load is stored at `location` (staged writes included).
    pub fn exists_by_location(&self, location: LocationId) -> TransferResult<bool> {
        for id in self.snapshot.unit_load_ids_at(location)? {
            match self.staged.get(&id) {
                Some(staged) if staged.location() != location => continue,
                _ => return Ok(true),
            }
        }
        Ok(self.staged.values().any(|ul| ul.location() == location))
    }

    pub fn stage(&mut self, unit_load: UnitLoad) {
        self.staged.insert(unit_load.id(), unit_load);
    }

    /// Record a dependency on `location`: the commit fails if it changed meanwhile.
    pub fn touch_location(&mut self, location: &StorageLocation) {
        self.touched_locations
            .entry(location.id())
            .or_insert(location.version());
    }

    pub fn reserve(&mut self, op: ReservationOp) {
        self.reservations.push(op);
    }

    pub fn journal(&mut self, entry: JournalEntry) {
        self.journal.push(entry);
    }

    pub fn notify(&mut self, notice: PlacementNotice) {
        self.notices.push(notice);
    }

    /// Hold back `anomaly` until the operation commits.
    pub fn report(&mut self, anomaly: DataAnomaly) {
        if !self.anomalies.contains(&anomaly) {
            self.anomalies.push(anomaly);
        }
    }

    pub fn journal_entries(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn anomalies(&self) -> &[DataAnomaly] {
        &self.anomalies
    }

    /// Close the unit of work: the changeset for the store, anomalies for after commit.
    pub fn finish(self) -> (Changeset, Vec<DataAnomaly>) {
        let changeset = Changeset {
            unit_loads: self.staged.into_values().collect(),
            locations: self.touched_locations.into_iter().collect(),
            reservations: self.reservations,
            notices: self.notices,
            journal: self.journal,
        };
        (changeset, self.anomalies)
    }
}
