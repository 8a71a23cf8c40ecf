//! Test doubles for the collaborator ports.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use stockyard_core::{Entity, LocationId, UnitLoadId, Versioned};
use stockyard_events::JournalEntry;

use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::model::{FixAssignment, StorageLocation, UnitLoad};
use crate::ports::{
    AnomalyLog, Collaborators, DataAnomaly, FixAssignmentLookup, PlacementHooks,
    WarehouseSnapshot, WarehouseStore, WellKnownLocations,
};
use crate::transfer::TransferService;
use crate::unit_of_work::{Changeset, PlacementNotice, ReservationOp};

#[derive(Default)]
struct State {
    locations: BTreeMap<LocationId, StorageLocation>,
    unit_loads: BTreeMap<UnitLoadId, UnitLoad>,
    reservations: Vec<ReservationOp>,
    journal: Vec<JournalEntry>,
}

#[derive(Default)]
pub struct FakeWarehouse {
    state: Mutex<State>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&self, name: &str) -> LocationId {
        self.insert_location(StorageLocation::new(name))
    }

    pub fn insert_location(&self, location: StorageLocation) -> LocationId {
        let id = location.id();
        self.state.lock().unwrap().locations.insert(id, location);
        id
    }

    pub fn add_unit_load(&self, unit_load: UnitLoad) -> UnitLoadId {
        let id = unit_load.id();
        self.state.lock().unwrap().unit_loads.insert(id, unit_load);
        id
    }

    pub fn unit_load(&self, id: UnitLoadId) -> UnitLoad {
        self.state.lock().unwrap().unit_loads[&id].clone()
    }

    pub fn location_named(&self, name: &str) -> Option<LocationId> {
        let state = self.state.lock().unwrap();
        state
            .locations
            .values()
            .find(|l| l.name() == name)
            .map(|l| l.id())
    }

    pub fn reservations(&self) -> Vec<ReservationOp> {
        self.state.lock().unwrap().reservations.clone()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().unwrap().journal.clone()
    }
}

impl WarehouseSnapshot for FakeWarehouse {
    fn find_unit_load(&self, id: UnitLoadId) -> TransferResult<Option<UnitLoad>> {
        Ok(self.state.lock().unwrap().unit_loads.get(&id).cloned())
    }

    fn find_location(&self, id: LocationId) -> TransferResult<Option<StorageLocation>> {
        Ok(self.state.lock().unwrap().locations.get(&id).cloned())
    }

    fn unit_loads_carried_by(&self, carrier: UnitLoadId) -> TransferResult<Vec<UnitLoad>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .unit_loads
            .values()
            .filter(|ul| ul.carrier_id() == Some(carrier))
            .cloned()
            .collect())
    }

    fn unit_load_ids_at(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .unit_loads
            .values()
            .filter(|ul| ul.location() == location)
            .map(|ul| ul.id())
            .collect())
    }
}

impl WarehouseStore for FakeWarehouse {
    fn commit(&self, changes: Changeset, hooks: &dyn PlacementHooks) -> TransferResult<()> {
        let mut state = self.state.lock().unwrap();
        for ul in &changes.unit_loads {
            let current = state.unit_loads.get(&ul.id()).map(|c| c.version()).unwrap_or(0);
            if current != ul.version() {
                return Err(TransferError::ConcurrentModification(ul.label_id().to_string()));
            }
        }
        for (id, version) in &changes.locations {
            let current = state.locations.get(id).map(|l| l.version()).unwrap_or(0);
            if current != *version {
                return Err(TransferError::ConcurrentModification(id.to_string()));
            }
        }
        hooks.deliver_all(&changes.notices)?;
        state.journal.extend(changes.journal);
        state.reservations.extend(changes.reservations);
        for mut ul in changes.unit_loads {
            ul.stamp_version(ul.version() + 1);
            state.unit_loads.insert(ul.id(), ul);
        }
        for (id, _) in changes.locations {
            if let Some(location) = state.locations.get_mut(&id) {
                location.stamp_version(location.version() + 1);
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeFixAssignments {
    assignments: Mutex<Vec<FixAssignment>>,
}

impl FakeFixAssignments {
    pub fn assign(&self, assignment: FixAssignment) {
        self.assignments.lock().unwrap().push(assignment);
    }
}

impl FixAssignmentLookup for FakeFixAssignments {
    fn first_assignment(&self, location: LocationId) -> TransferResult<Option<FixAssignment>> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments.iter().find(|a| a.location == location).cloned())
    }
}

#[derive(Default)]
pub struct RecordingHooks {
    pub notices: Mutex<Vec<PlacementNotice>>,
}

impl PlacementHooks for RecordingHooks {
    fn on_removed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()> {
        self.notices
            .lock()
            .unwrap()
            .push(PlacementNotice::Removed { location, unit_load });
        Ok(())
    }

    fn on_placed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()> {
        self.notices
            .lock()
            .unwrap()
            .push(PlacementNotice::Placed { location, unit_load });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAnomalies {
    pub anomalies: Mutex<Vec<DataAnomaly>>,
}

impl AnomalyLog for RecordingAnomalies {
    fn record(&self, anomaly: DataAnomaly) {
        self.anomalies.lock().unwrap().push(anomaly);
    }
}

pub struct NamedLocations {
    warehouse: Arc<FakeWarehouse>,
    config: TransferConfig,
}

impl WellKnownLocations for NamedLocations {
    fn trash_location(&self) -> TransferResult<LocationId> {
        self.warehouse
            .location_named(&self.config.trash_location)
            .ok_or_else(|| TransferError::WellKnownLocationMissing(self.config.trash_location.clone()))
    }

    fn clearing_location(&self) -> TransferResult<LocationId> {
        self.warehouse
            .location_named(&self.config.clearing_location)
            .ok_or_else(|| {
                TransferError::WellKnownLocationMissing(self.config.clearing_location.clone())
            })
    }
}

/// A service over a fake warehouse plus handles to every test double.
pub struct Harness {
    pub warehouse: Arc<FakeWarehouse>,
    pub fix_assignments: Arc<FakeFixAssignments>,
    pub hooks: Arc<RecordingHooks>,
    pub anomalies: Arc<RecordingAnomalies>,
    pub service: TransferService<Arc<FakeWarehouse>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(TransferConfig::default())
    }

    pub fn with_config(config: TransferConfig) -> Self {
        let warehouse = Arc::new(FakeWarehouse::new());
        let fix_assignments = Arc::new(FakeFixAssignments::default());
        let hooks = Arc::new(RecordingHooks::default());
        let anomalies = Arc::new(RecordingAnomalies::default());
        let well_known = Arc::new(NamedLocations {
            warehouse: warehouse.clone(),
            config: config.clone(),
        });
        let collaborators = Collaborators {
            fix_assignments: fix_assignments.clone(),
            hooks: hooks.clone(),
            well_known,
            anomalies: anomalies.clone(),
        };
        let service = TransferService::new(warehouse.clone(), collaborators, config);
        Self {
            warehouse,
            fix_assignments,
            hooks,
            anomalies,
            service,
        }
    }

    pub fn journal_len(&self) -> usize {
        self.warehouse.journal().len()
    }

    /// Build a chain `ids[0] <- ids[1] <- ...` of `len` unit loads at `location`.
    pub fn chain(&self, location: LocationId, len: usize) -> Vec<UnitLoadId> {
        let mut ids: Vec<UnitLoadId> = Vec::with_capacity(len);
        for n in 0..len {
            let mut ul = UnitLoad::new(format!("C{n}"), location).with_carrier_flag(n + 1 < len);
            if let Some(parent) = ids.last() {
                ul = ul.carried_by(*parent);
            }
            ids.push(self.warehouse.add_unit_load(ul));
        }
        ids
    }
}
