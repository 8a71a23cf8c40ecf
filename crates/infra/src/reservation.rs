//! Per-location capacity reservations.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use stockyard_core::{LocationId, UnitLoadId};
use stockyard_location::{ReservationManager, TransferError, TransferResult};

type Slot = Arc<Mutex<BTreeSet<UnitLoadId>>>;

/// In-memory reservation manager.
///
/// Each location owns its own lock, so changes at one location are
/// serialized while different locations proceed independently. Locations are
/// unlimited unless [`InMemoryReservationManager::limit_capacity`] says otherwise.
#[derive(Debug, Default)]
pub struct InMemoryReservationManager {
    slots: Mutex<HashMap<LocationId, Slot>>,
    capacities: Mutex<HashMap<LocationId, usize>>,
    allocations: AtomicU64,
    deallocations: AtomicU64,
}

fn poisoned() -> TransferError {
    TransferError::Reservation("lock poisoned".to_string())
}

impl InMemoryReservationManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, location: LocationId) -> TransferResult<Slot> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;
        Ok(slots.entry(location).or_default().clone())
    }

    fn lock(slot: &Slot) -> TransferResult<MutexGuard<'_, BTreeSet<UnitLoadId>>> {
        slot.lock().map_err(|_| poisoned())
    }

    /// Allow at most `capacity` reservations at `location`.
    pub fn limit_capacity(&self, location: LocationId, capacity: usize) -> TransferResult<()> {
        self.capacities
            .lock()
            .map_err(|_| poisoned())?
            .insert(location, capacity);
        Ok(())
    }

    fn capacity(&self, location: LocationId) -> TransferResult<Option<usize>> {
        Ok(self
            .capacities
            .lock()
            .map_err(|_| poisoned())?
            .get(&location)
            .copied())
    }

    /// Unit loads currently holding a reservation at `location`.
    pub fn reserved_at(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>> {
        let slot = self.slot(location)?;
        let reserved = Self::lock(&slot)?;
        Ok(reserved.iter().copied().collect())
    }

    pub fn total_reserved(&self) -> TransferResult<usize> {
        let slots: Vec<Slot> = self
            .slots
            .lock()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();
        let mut total = 0;
        for slot in &slots {
            total += Self::lock(slot)?.len();
        }
        Ok(total)
    }

    /// Number of `allocate` calls received so far.
    pub fn allocation_calls(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Number of `deallocate` calls received so far.
    pub fn deallocation_calls(&self) -> u64 {
        self.deallocations.load(Ordering::Relaxed)
    }
}

impl ReservationManager for InMemoryReservationManager {
    fn allocate(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<bool> {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let capacity = self.capacity(location)?;
        let slot = self.slot(location)?;
        let mut reserved = Self::lock(&slot)?;
        if reserved.contains(&unit_load) {
            tracing::debug!(%location, %unit_load, "reservation already held");
            return Ok(false);
        }
        if capacity.is_some_and(|capacity| reserved.len() >= capacity) {
            return Err(TransferError::Reservation(format!(
                "capacity exhausted at location {location}"
            )));
        }
        reserved.insert(unit_load);
        Ok(true)
    }

    fn deallocate(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<bool> {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        let slot = self.slot(location)?;
        let released = Self::lock(&slot)?.remove(&unit_load);
        if !released {
            tracing::debug!(%location, %unit_load, "no reservation to release");
        }
        Ok(released)
    }

    fn deallocate_complete(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>> {
        let slot = self.slot(location)?;
        let mut reserved = Self::lock(&slot)?;
        if !reserved.is_empty() {
            tracing::debug!(%location, released = reserved.len(), "location emptied");
        }
        Ok(std::mem::take(&mut *reserved).into_iter().collect())
    }
}
