use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockyard_core::{DomainError, Entity, ExpectedVersion, LocationId, UnitLoadId, Versioned};
use stockyard_events::JournalSink;
use stockyard_location::{
    Changeset, LocationLockState, PlacementHooks, ReservationManager, StorageLocation,
    TransferError, TransferResult, UnitLoad, WarehouseSnapshot, WarehouseStore,
};

#[derive(Debug, Default)]
struct Records {
    locations: HashMap<LocationId, StorageLocation>,
    // Ordered by id so carrier children come back in a stable order.
    unit_loads: BTreeMap<UnitLoadId, UnitLoad>,
}

/// In-memory warehouse store.
///
/// Intended for tests/dev. A commit holds the write lock for its whole
/// duration. Versions are checked, then the reservation operations are
/// applied, the placement hooks notified and the journal batch appended, in
/// that order and before any record is replaced. A failing step undoes the
/// steps before it: reservations are reverted and delivered notices revoked.
/// The journal append is the last fallible step.
pub struct InMemoryWarehouse {
    records: RwLock<Records>,
    reservations: Arc<dyn ReservationManager>,
    journal: Arc<dyn JournalSink>,
}

impl core::fmt::Debug for InMemoryWarehouse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryWarehouse")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

fn poisoned() -> TransferError {
    TransferError::Store("lock poisoned".to_string())
}

impl InMemoryWarehouse {
    pub fn new(reservations: Arc<dyn ReservationManager>, journal: Arc<dyn JournalSink>) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            reservations,
            journal,
        }
    }

    fn read(&self) -> TransferResult<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|_| poisoned())
    }

    fn write(&self) -> TransferResult<RwLockWriteGuard<'_, Records>> {
        self.records.write().map_err(|_| poisoned())
    }

    /// Register an open location named `name`.
    pub fn add_location(&self, name: &str) -> TransferResult<LocationId> {
        self.insert_location(StorageLocation::new(name))
    }

    /// Register a location. Names must be unique.
    pub fn insert_location(&self, location: StorageLocation) -> TransferResult<LocationId> {
        let mut records = self.write()?;
        if records.locations.values().any(|l| l.name() == location.name()) {
            return Err(DomainError::invariant(format!(
                "location '{}' already exists",
                location.name()
            ))
            .into());
        }
        let id = location.id();
        records.locations.insert(id, location);
        Ok(id)
    }

    /// Register a unit load. Its location and carrier must already exist.
    pub fn insert_unit_load(&self, unit_load: UnitLoad) -> TransferResult<UnitLoadId> {
        let mut records = self.write()?;
        if !records.locations.contains_key(&unit_load.location()) {
            return Err(TransferError::LocationNotFound(unit_load.location()));
        }
        if let Some(carrier) = unit_load.carrier_id() {
            if carrier != unit_load.id() && !records.unit_loads.contains_key(&carrier) {
                return Err(TransferError::UnitLoadNotFound(carrier));
            }
        }
        if records.unit_loads.values().any(|ul| ul.label_id() == unit_load.label_id()) {
            return Err(DomainError::invariant(format!(
                "label '{}' already in use",
                unit_load.label_id()
            ))
            .into());
        }
        let id = unit_load.id();
        records.unit_loads.insert(id, unit_load);
        Ok(id)
    }

    pub fn location_by_name(&self, name: &str) -> TransferResult<Option<StorageLocation>> {
        Ok(self
            .read()?
            .locations
            .values()
            .find(|l| l.name() == name)
            .cloned())
    }

    pub fn unit_load_by_label(&self, label: &str) -> TransferResult<Option<UnitLoad>> {
        Ok(self
            .read()?
            .unit_loads
            .values()
            .find(|ul| ul.label_id() == label)
            .cloned())
    }

    /// Change the lock state of a location.
    ///
    /// Bumps the location version, so transfers that read the old state fail
    /// their commit with a concurrent modification.
    pub fn set_location_lock(
        &self,
        location: LocationId,
        lock_state: LocationLockState,
    ) -> TransferResult<()> {
        let mut records = self.write()?;
        let stored = records
            .locations
            .get_mut(&location)
            .ok_or(TransferError::LocationNotFound(location))?;
        stored.set_lock_state(lock_state);
        stored.stamp_version(stored.version() + 1);
        tracing::info!(location = stored.name(), %lock_state, "location lock changed");
        Ok(())
    }

    fn check_versions(records: &Records, changes: &Changeset) -> TransferResult<()> {
        for staged in &changes.unit_loads {
            let stored = records
                .unit_loads
                .get(&staged.id())
                .ok_or(TransferError::UnitLoadNotFound(staged.id()))?;
            ExpectedVersion::Exact(staged.version())
                .check(stored.version())
                .map_err(|_| {
                    TransferError::ConcurrentModification(format!(
                        "unit load '{}' changed (read version {}, stored {})",
                        staged.label_id(),
                        staged.version(),
                        stored.version()
                    ))
                })?;
        }
        for (id, read_version) in &changes.locations {
            let stored = records
                .locations
                .get(id)
                .ok_or(TransferError::LocationNotFound(*id))?;
            ExpectedVersion::Exact(*read_version)
                .check(stored.version())
                .map_err(|_| {
                    TransferError::ConcurrentModification(format!(
                        "location '{}' changed (read version {read_version}, stored {})",
                        stored.name(),
                        stored.version()
                    ))
                })?;
        }
        Ok(())
    }
}

impl WarehouseSnapshot for InMemoryWarehouse {
    fn find_unit_load(&self, id: UnitLoadId) -> TransferResult<Option<UnitLoad>> {
        Ok(self.read()?.unit_loads.get(&id).cloned())
    }

    fn find_location(&self, id: LocationId) -> TransferResult<Option<StorageLocation>> {
        Ok(self.read()?.locations.get(&id).cloned())
    }

    fn unit_loads_carried_by(&self, carrier: UnitLoadId) -> TransferResult<Vec<UnitLoad>> {
        Ok(self
            .read()?
            .unit_loads
            .values()
            .filter(|ul| ul.carrier_id() == Some(carrier))
            .cloned()
            .collect())
    }

    fn unit_load_ids_at(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>> {
        Ok(self
            .read()?
            .unit_loads
            .values()
            .filter(|ul| ul.location() == location)
            .map(|ul| ul.id())
            .collect())
    }
}

impl WarehouseStore for InMemoryWarehouse {
    fn commit(&self, changes: Changeset, hooks: &dyn PlacementHooks) -> TransferResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut records = self.write()?;
        Self::check_versions(&records, &changes)?;

        let Changeset {
            unit_loads,
            locations,
            reservations,
            notices,
            journal,
        } = changes;

        let undo = self.reservations.apply_all(&reservations)?;
        if let Err(err) = hooks.deliver_all(&notices) {
            self.reservations.revert(undo);
            return Err(err);
        }
        if !journal.is_empty() {
            if let Err(err) = self.journal.record_all(journal) {
                tracing::warn!(error = %err, "journal append failed, rolling back commit");
                hooks.revoke_all(&notices);
                self.reservations.revert(undo);
                return Err(err.into());
            }
        }

        let written = unit_loads.len();
        for mut unit_load in unit_loads {
            unit_load.stamp_version(unit_load.version() + 1);
            records.unit_loads.insert(unit_load.id(), unit_load);
        }
        for (id, _) in locations {
            if let Some(location) = records.locations.get_mut(&id) {
                location.stamp_version(location.version() + 1);
            }
        }

        tracing::debug!(unit_loads = written, "changeset committed");
        Ok(())
    }
}
