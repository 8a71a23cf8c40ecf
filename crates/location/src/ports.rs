//! Collaborator interfaces consumed by the transfer engine.
//!
//! The engine never owns persistence, reservations, journaling or location
//! roles. It talks to them through these traits so that tests and production
//! wire different implementations of the same capability.

use std::sync::Arc;

use stockyard_core::{LocationId, UnitLoadId};

use crate::error::TransferResult;
use crate::model::{FixAssignment, StorageLocation, UnitLoad};
use crate::unit_of_work::{Changeset, PlacementNotice, ReservationOp};

/// Read access to committed warehouse records.
pub trait WarehouseSnapshot: Send + Sync {
    fn find_unit_load(&self, id: UnitLoadId) -> TransferResult<Option<UnitLoad>>;

    fn find_location(&self, id: LocationId) -> TransferResult<Option<StorageLocation>>;

    /// Unit loads whose `carrier_id` equals `carrier`, in a stable order.
    fn unit_loads_carried_by(&self, carrier: UnitLoadId) -> TransferResult<Vec<UnitLoad>>;

    /// Unit loads whose stored location equals `location`.
    fn unit_load_ids_at(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>>;
}

/// Transaction boundary for transfer changesets.
///
/// `commit` is all-or-nothing. Implementations must:
/// - reject the whole changeset with `TransferError::ConcurrentModification`
///   when any staged unit load or touched location changed since it was read
/// - apply reservation operations (in order), deliver the placement notices to
///   `hooks` and append the journal batch before any record is written; when
///   one of these steps fails the earlier ones are undone and nothing is written
/// - bump the version of every written unit load and touched location
pub trait WarehouseStore: WarehouseSnapshot {
    fn commit(&self, changes: Changeset, hooks: &dyn PlacementHooks) -> TransferResult<()>;
}

impl<S> WarehouseSnapshot for Arc<S>
where
    S: WarehouseSnapshot + ?Sized,
{
    fn find_unit_load(&self, id: UnitLoadId) -> TransferResult<Option<UnitLoad>> {
        (**self).find_unit_load(id)
    }

    fn find_location(&self, id: LocationId) -> TransferResult<Option<StorageLocation>> {
        (**self).find_location(id)
    }

    fn unit_loads_carried_by(&self, carrier: UnitLoadId) -> TransferResult<Vec<UnitLoad>> {
        (**self).unit_loads_carried_by(carrier)
    }

    fn unit_load_ids_at(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>> {
        (**self).unit_load_ids_at(location)
    }
}

impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    fn commit(&self, changes: Changeset, hooks: &dyn PlacementHooks) -> TransferResult<()> {
        (**self).commit(changes, hooks)
    }
}

/// Capacity accounting per location.
///
/// Changes at one location must be serialized against other changes at the
/// same location.
pub trait ReservationManager: Send + Sync {
    /// Returns `false` when `unit_load` already held a reservation there.
    fn allocate(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<bool>;

    /// Returns `false` when there was no reservation to release.
    fn deallocate(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<bool>;

    /// Release every reservation held at `location` and return the released loads.
    fn deallocate_complete(&self, location: LocationId) -> TransferResult<Vec<UnitLoadId>>;

    /// Apply `ops` in order, all or nothing.
    ///
    /// On success returns the operations that undo the batch, for [`revert`].
    /// On failure everything applied so far has already been undone.
    ///
    /// [`revert`]: ReservationManager::revert
    fn apply_all(&self, ops: &[ReservationOp]) -> TransferResult<Vec<ReservationOp>> {
        let mut undo = Vec::new();
        for op in ops {
            let applied = match *op {
                ReservationOp::Allocate { location, unit_load } => {
                    self.allocate(location, unit_load).map(|reserved| {
                        reserved
                            .then_some(ReservationOp::Deallocate { location, unit_load })
                            .into_iter()
                            .collect::<Vec<_>>()
                    })
                }
                ReservationOp::Deallocate { location, unit_load } => {
                    self.deallocate(location, unit_load).map(|released| {
                        released
                            .then_some(ReservationOp::Allocate { location, unit_load })
                            .into_iter()
                            .collect::<Vec<_>>()
                    })
                }
                ReservationOp::DeallocateComplete { location } => {
                    self.deallocate_complete(location).map(|released| {
                        released
                            .into_iter()
                            .map(|unit_load| ReservationOp::Allocate { location, unit_load })
                            .collect::<Vec<_>>()
                    })
                }
            };
            match applied {
                Ok(inverse) => undo.extend(inverse),
                Err(err) => {
                    self.revert(undo);
                    return Err(err);
                }
            }
        }
        Ok(undo)
    }

    /// Run the undo operations returned by [`ReservationManager::apply_all`], newest first.
    fn revert(&self, undo: Vec<ReservationOp>) {
        for op in undo.into_iter().rev() {
            let result = match op {
                ReservationOp::Allocate { location, unit_load } => self.allocate(location, unit_load),
                ReservationOp::Deallocate { location, unit_load } => self.deallocate(location, unit_load),
                ReservationOp::DeallocateComplete { location } => {
                    self.deallocate_complete(location).map(|released| !released.is_empty())
                }
            };
            if let Err(err) = result {
                tracing::error!(?op, error = %err, "failed to revert reservation");
            }
        }
    }
}

pub trait FixAssignmentLookup: Send + Sync {
    fn first_assignment(&self, location: LocationId) -> TransferResult<Option<FixAssignment>>;
}

/// Custom location behavior, notified while a transfer commits.
///
/// Hooks run inside [`WarehouseStore::commit`] and must not call back into the
/// store. An error aborts the commit.
pub trait PlacementHooks: Send + Sync {
    fn on_removed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()>;

    fn on_placed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()>;

    /// Deliver `notices` in order. When one is refused, the notices delivered
    /// before it are revoked and the refusal is returned.
    fn deliver_all(&self, notices: &[PlacementNotice]) -> TransferResult<()> {
        for (delivered, notice) in notices.iter().enumerate() {
            let result = match *notice {
                PlacementNotice::Removed { location, unit_load } => self.on_removed(location, unit_load),
                PlacementNotice::Placed { location, unit_load } => self.on_placed(location, unit_load),
            };
            if let Err(err) = result {
                tracing::warn!(?notice, error = %err, "placement hook refused transfer");
                self.revoke_all(&notices[..delivered]);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Take back delivered notices, newest first: a placement is reported as a
    /// removal from the same location and a removal as a placement.
    fn revoke_all(&self, notices: &[PlacementNotice]) {
        for notice in notices.iter().rev() {
            let result = match *notice {
                PlacementNotice::Removed { location, unit_load } => self.on_placed(location, unit_load),
                PlacementNotice::Placed { location, unit_load } => self.on_removed(location, unit_load),
            };
            if let Err(err) = result {
                tracing::error!(?notice, error = %err, "failed to revoke placement notice");
            }
        }
    }
}

/// Resolves locations by their operational role.
pub trait WellKnownLocations: Send + Sync {
    fn trash_location(&self) -> TransferResult<LocationId>;

    fn clearing_location(&self) -> TransferResult<LocationId>;
}

/// Data-integrity anomaly found while walking existing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAnomaly {
    /// A unit load references itself as its own carrier.
    SelfCarrier { unit_load: UnitLoadId, label: String },
}

pub trait AnomalyLog: Send + Sync {
    fn record(&self, anomaly: DataAnomaly);
}

/// Collaborators injected into [`crate::TransferService`] next to its store.
#[derive(Clone)]
pub struct Collaborators {
    pub fix_assignments: Arc<dyn FixAssignmentLookup>,
    pub hooks: Arc<dyn PlacementHooks>,
    pub well_known: Arc<dyn WellKnownLocations>,
    pub anomalies: Arc<dyn AnomalyLog>,
}

impl core::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
