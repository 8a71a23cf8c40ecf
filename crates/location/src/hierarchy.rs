//! Carrier hierarchy queries.
//!
//! Unit loads form a forest through `carrier_id` back-references. Every walk
//! here goes through the unit of work one lookup at a time and is bounded by
//! the configured maximum carrier depth, so corrupt (cyclic or overly deep)
//! data ends the walk with an error instead of looping.

use std::collections::BTreeSet;

use stockyard_core::{Entity, LocationId, UnitLoadId};

use crate::error::{TransferError, TransferResult};
use crate::model::UnitLoad;
use crate::ports::WarehouseSnapshot;
use crate::unit_of_work::UnitOfWork;

impl<S> UnitOfWork<'_, S>
where
    S: WarehouseSnapshot + ?Sized,
{
    pub fn has_children(&self, unit_load: UnitLoadId) -> TransferResult<bool> {
        Ok(!self.children(unit_load)?.is_empty())
    }

    /// True when `carrier` has a child other than `excluding`.
    pub fn has_other_children(
        &self,
        carrier: UnitLoadId,
        excluding: UnitLoadId,
    ) -> TransferResult<bool> {
        Ok(self
            .children(carrier)?
            .iter()
            .any(|child| child.id() != excluding))
    }

    /// Carriers of `unit_load`, nearest first.
    ///
    /// A load naming itself as carrier, or naming a carrier that no longer
    /// exists, ends the chain. A longer cycle is reported as
    /// `CarrierSelfReference`; more than `max_carrier_depth` ancestors as
    /// `CarrierMaxDepthExceeded`.
    pub fn ancestors(&self, unit_load: &UnitLoad) -> TransferResult<Vec<UnitLoad>> {
        let max_depth = self.max_carrier_depth();
        let mut chain: Vec<UnitLoad> = Vec::new();
        let mut visited = BTreeSet::from([unit_load.id()]);
        let mut current = unit_load.clone();

        while let Some(carrier_id) = current.carrier_id() {
            if carrier_id == current.id() {
                break;
            }
            if !visited.insert(carrier_id) {
                return Err(TransferError::CarrierSelfReference {
                    label: current.label_id().to_string(),
                });
            }
            if chain.len() >= max_depth {
                tracing::error!(
                    label = unit_load.label_id(),
                    max_depth,
                    "carrier chain exceeds maximum depth"
                );
                return Err(TransferError::CarrierMaxDepthExceeded { max_depth });
            }
            let Some(carrier) = self.find_unit_load(carrier_id)? else {
                tracing::warn!(
                    label = current.label_id(),
                    carrier = %carrier_id,
                    "dangling carrier reference"
                );
                break;
            };
            chain.push(carrier.clone());
            current = carrier;
        }

        Ok(chain)
    }

    /// The top of the carrier chain (the load itself when it is a root).
    pub fn root_of(&self, unit_load: &UnitLoad) -> TransferResult<UnitLoad> {
        Ok(self
            .ancestors(unit_load)?
            .pop()
            .unwrap_or_else(|| unit_load.clone()))
    }

    /// The location a unit load ultimately occupies: its root's location.
    pub fn effective_location(&self, unit_load: &UnitLoad) -> TransferResult<LocationId> {
        Ok(self.root_of(unit_load)?.location())
    }

    /// True when `ancestor` appears in the carrier chain above `candidate`.
    pub fn has_ancestor(&self, candidate: &UnitLoad, ancestor: UnitLoadId) -> TransferResult<bool> {
        Ok(self
            .ancestors(candidate)?
            .iter()
            .any(|carrier| carrier.id() == ancestor))
    }
}
