//! Transfer orchestration.
//!
//! [`TransferService`] is the entry point of the engine. Each public
//! operation:
//!
//! 1. opens a [`UnitOfWork`] over the store,
//! 2. validates and stages every change (policy checks, carrier links,
//!    reservations, propagation, journal entries),
//! 3. commits the resulting [`crate::Changeset`] in one step, placement hooks
//!    included, and
//! 4. reports the data anomalies found while staging.
//!
//! Any error leaves the store untouched and reports nothing. A stale read
//! surfaces as a retryable `TransferError::ConcurrentModification`.

use stockyard_core::{Entity, LocationId, UnitLoadId, UserId};

use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::model::UnitLoad;
use crate::policy;
use crate::ports::{Collaborators, DataAnomaly, WarehouseSnapshot, WarehouseStore};
use crate::propagate::{Propagation, RebaseTarget};
use crate::unit_of_work::{PlacementNotice, ReservationOp, UnitOfWork};

/// Options of a single unit-load transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Slot hint at the destination; `None` keeps each load's current index.
    pub index: Option<u32>,
    /// Place the load even if the destination lock state forbids it.
    pub ignore_lock: bool,
    /// Allocate a reservation for the load at the destination.
    pub reserve: bool,
    pub comment: String,
    pub activity_code: String,
}

impl Default for TransferRequest {
    fn default() -> Self {
        Self {
            index: None,
            ignore_lock: false,
            reserve: true,
            comment: String::new(),
            activity_code: String::new(),
        }
    }
}

impl TransferRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn ignore_lock(mut self, ignore_lock: bool) -> Self {
        self.ignore_lock = ignore_lock;
        self
    }

    pub fn reserve(mut self, reserve: bool) -> Self {
        self.reserve = reserve;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn activity_code(mut self, activity_code: impl Into<String>) -> Self {
        self.activity_code = activity_code.into();
        self
    }
}

#[derive(Debug)]
pub struct TransferService<S> {
    store: S,
    collaborators: Collaborators,
    config: TransferConfig,
}

impl<S> TransferService<S> {
    pub fn new(store: S, collaborators: Collaborators, config: TransferConfig) -> Self {
        Self {
            store,
            collaborators,
            config,
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub(crate) fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }
}

impl<S> TransferService<S>
where
    S: WarehouseStore,
{
    pub(crate) fn begin(&self) -> UnitOfWork<'_, S> {
        UnitOfWork::new(&self.store, self.config.max_carrier_depth)
    }

    /// Move `unit_load` to `destination` with [`TransferRequest::default`] options.
    pub fn transfer_unit_load(
        &self,
        actor: UserId,
        destination: LocationId,
        unit_load: UnitLoadId,
    ) -> TransferResult<()> {
        self.transfer_unit_load_with(actor, destination, unit_load, &TransferRequest::default())
    }

    /// Move `unit_load` (and everything stacked on it) to `destination`.
    pub fn transfer_unit_load_with(
        &self,
        actor: UserId,
        destination: LocationId,
        unit_load: UnitLoadId,
        request: &TransferRequest,
    ) -> TransferResult<()> {
        let mut uow = self.begin();
        self.stage_transfer(&mut uow, actor, destination, unit_load, request)?;
        self.commit(uow)
    }

    /// Stack `source` onto `destination`; `source` becomes a child of `destination`.
    pub fn transfer_to_carrier(
        &self,
        actor: UserId,
        source: UnitLoadId,
        destination: UnitLoadId,
        comment: &str,
        activity_code: &str,
    ) -> TransferResult<()> {
        let mut uow = self.begin();
        self.stage_carrier_placement(&mut uow, actor, source, destination, comment, activity_code)?;
        self.commit(uow)
    }

    pub(crate) fn stage_transfer(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        actor: UserId,
        destination: LocationId,
        unit_load: UnitLoadId,
        request: &TransferRequest,
    ) -> TransferResult<()> {
        let dest = uow.location(destination)?;
        let mut ul = uow.unit_load(unit_load)?;

        let has_children = uow.has_other_children(ul.id(), ul.id())?;
        let fix_assignment = self.collaborators.fix_assignments.first_assignment(destination)?;
        policy::can_accept(&dest, &ul, has_children, fix_assignment.as_ref(), request.ignore_lock)?;

        let source = uow.location(uow.effective_location(&ul)?)?;
        let label = ul.label_id().to_string();

        if let Some(carrier_id) = ul.carrier_id() {
            Self::release_carrier(uow, &mut ul, carrier_id)?;
            ul.detach_from_carrier();
        }

        uow.touch_location(&source);
        uow.touch_location(&dest);

        uow.reserve(ReservationOp::Deallocate {
            location: source.id(),
            unit_load,
        });
        if request.reserve {
            uow.reserve(ReservationOp::Allocate {
                location: destination,
                unit_load,
            });
        }

        let propagation = Propagation::new(
            uow,
            unit_load,
            source.id(),
            RebaseTarget::Location(destination),
            actor,
        )?
        .with_index(request.index)
        .with_activity(&request.activity_code, &request.comment);
        propagation.run(uow, ul)?;

        if !uow.exists_by_location(source.id())? {
            uow.reserve(ReservationOp::DeallocateComplete {
                location: source.id(),
            });
        }

        if source.id() != destination {
            uow.notify(PlacementNotice::Removed {
                location: source.id(),
                unit_load,
            });
            uow.notify(PlacementNotice::Placed {
                location: destination,
                unit_load,
            });
        }

        tracing::info!(label = %label, location = dest.name(), "transferred unit load");
        Ok(())
    }

    fn stage_carrier_placement(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        actor: UserId,
        source: UnitLoadId,
        destination: UnitLoadId,
        comment: &str,
        activity_code: &str,
    ) -> TransferResult<()> {
        let mut ul = uow.unit_load(source)?;
        let label = ul.label_id().to_string();

        if source == destination {
            tracing::warn!(
                label = ul.label_id(),
                "source equals destination, cannot place unit load on itself"
            );
            return Err(TransferError::CarrierSelfReference {
                label: ul.label_id().to_string(),
            });
        }

        let carrier = uow.unit_load(destination)?;
        let carrier_label = carrier.label_id().to_string();
        let carrier_ancestors = uow.ancestors(&carrier)?;
        if carrier_ancestors.iter().any(|ancestor| ancestor.id() == source) {
            tracing::warn!(
                source = ul.label_id(),
                destination = carrier.label_id(),
                "destination is carried by source, cannot place unit load on its own child"
            );
            return Err(TransferError::CarrierSelfReference {
                label: carrier.label_id().to_string(),
            });
        }

        let source_location = uow.location(uow.effective_location(&ul)?)?;
        let target_location = uow.location(RebaseTarget::CarrierOf(destination).resolve(uow)?)?;

        // Fixed locations never hold composite loads.
        if self
            .collaborators
            .fix_assignments
            .first_assignment(target_location.id())?
            .is_some()
        {
            return Err(TransferError::CarrierNotAllowedOnFixedLocation {
                location: target_location.name().to_string(),
            });
        }

        uow.touch_location(&source_location);
        uow.touch_location(&target_location);

        match ul.carrier_id() {
            None => uow.reserve(ReservationOp::Deallocate {
                location: source_location.id(),
                unit_load: source,
            }),
            Some(old_carrier) => Self::release_carrier(uow, &mut ul, old_carrier)?,
        }

        ul.attach_to(destination, target_location.id());

        // Re-read: the old carrier may be the destination itself.
        let mut carrier = uow.unit_load(destination)?;
        carrier.set_carrier_flag(true);
        uow.stage(carrier);

        let propagation = Propagation::new(
            uow,
            source,
            source_location.id(),
            RebaseTarget::CarrierOf(destination),
            actor,
        )?
        .with_activity(activity_code, comment);
        // Depth counts from the root of the new carrier chain, not from the placed load.
        propagation.run_at(uow, ul, carrier_ancestors.len() + 1)?;

        if source_location.id() != target_location.id() {
            uow.notify(PlacementNotice::Removed {
                location: source_location.id(),
                unit_load: source,
            });
        }

        tracing::info!(
            source = %label,
            destination = carrier_label.as_str(),
            "placed unit load on carrier"
        );
        Ok(())
    }

    /// Clear the carrier flag of `carrier_id` when `ul` is its last child.
    fn release_carrier(
        uow: &mut UnitOfWork<'_, S>,
        ul: &mut UnitLoad,
        carrier_id: UnitLoadId,
    ) -> TransferResult<()> {
        if carrier_id == ul.id() {
            tracing::error!(label = ul.label_id(), "self reference detected, unit load is its own carrier");
            uow.report(DataAnomaly::SelfCarrier {
                unit_load: ul.id(),
                label: ul.label_id().to_string(),
            });
            if !uow.has_other_children(carrier_id, ul.id())? {
                ul.set_carrier_flag(false);
            }
            return Ok(());
        }

        if let Some(mut carrier) = uow.find_unit_load(carrier_id)? {
            if !uow.has_other_children(carrier_id, ul.id())? {
                carrier.set_carrier_flag(false);
                uow.stage(carrier);
            }
        }
        Ok(())
    }

    pub(crate) fn commit(&self, uow: UnitOfWork<'_, S>) -> TransferResult<()> {
        let (changes, anomalies) = uow.finish();
        self.store.commit(changes, self.collaborators.hooks.as_ref())?;

        for anomaly in anomalies {
            self.collaborators.anomalies.record(anomaly);
        }
        Ok(())
    }
}

impl<S> TransferService<S>
where
    S: WarehouseSnapshot,
{
    /// Committed effective location of `unit_load`.
    pub fn effective_location(&self, unit_load: UnitLoadId) -> TransferResult<LocationId> {
        let uow = UnitOfWork::new(&self.store, self.config.max_carrier_depth);
        let ul = uow.unit_load(unit_load)?;
        uow.effective_location(&ul)
    }
}
