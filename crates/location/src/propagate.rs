//! Carrier propagation: rebase a unit load and all its descendants.
//!
//! Moving a unit load moves everything stacked on it. The propagator walks
//! the subtree depth-first, pre-order (a parent is rebased before its
//! children are visited), writes one journal entry per node and stops the
//! whole operation once the walk goes deeper than the configured maximum.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockyard_core::{Entity, LocationId, UnitLoadId, UserId};
use stockyard_events::JournalEntry;

use crate::error::{TransferError, TransferResult};
use crate::model::UnitLoad;
use crate::ports::{DataAnomaly, WarehouseSnapshot};
use crate::unit_of_work::UnitOfWork;

/// Where a propagated subtree ends up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RebaseTarget {
    /// Directly onto a storage location.
    Location(LocationId),
    /// Onto whatever location the given unit load effectively occupies.
    CarrierOf(UnitLoadId),
}

impl RebaseTarget {
    /// Resolve the target location. Done once, at the root of the walk.
    pub fn resolve<S>(self, uow: &UnitOfWork<'_, S>) -> TransferResult<LocationId>
    where
        S: WarehouseSnapshot + ?Sized,
    {
        match self {
            RebaseTarget::Location(location) => Ok(location),
            RebaseTarget::CarrierOf(carrier) => {
                let carrier = uow.unit_load(carrier)?;
                uow.effective_location(&carrier)
            }
        }
    }
}

/// One propagation run, shared by every node of the subtree.
pub struct Propagation<'c> {
    root: UnitLoadId,
    source: LocationId,
    destination: LocationId,
    index: Option<u32>,
    actor: UserId,
    activity_code: &'c str,
    comment: &'c str,
    occurred_at: DateTime<Utc>,
}

impl<'c> Propagation<'c> {
    pub fn new<S>(
        uow: &UnitOfWork<'_, S>,
        root: UnitLoadId,
        source: LocationId,
        target: RebaseTarget,
        actor: UserId,
    ) -> TransferResult<Self>
    where
        S: WarehouseSnapshot + ?Sized,
    {
        Ok(Self {
            root,
            source,
            destination: target.resolve(uow)?,
            index: None,
            actor,
            activity_code: "",
            comment: "",
            occurred_at: Utc::now(),
        })
    }

    pub fn with_index(mut self, index: Option<u32>) -> Self {
        self.index = index;
        self
    }

    pub fn with_activity(mut self, activity_code: &'c str, comment: &'c str) -> Self {
        self.activity_code = activity_code;
        self.comment = comment;
        self
    }

    pub fn destination(&self) -> LocationId {
        self.destination
    }

    /// Rebase `node` and its subtree. Returns the number of rebased unit loads.
    pub fn run<S>(&self, uow: &mut UnitOfWork<'_, S>, node: UnitLoad) -> TransferResult<usize>
    where
        S: WarehouseSnapshot + ?Sized,
    {
        self.rebase(uow, node, 0)
    }

    /// Like [`Propagation::run`] for a node that sits `depth` levels below a root.
    ///
    /// Carrier placement starts here instead of at depth 0: the placed node
    /// counts from the root of its new carrier chain, so stacking can never
    /// produce a chain deeper than the configured maximum. Transfers to a
    /// location still use [`Propagation::run`].
    pub fn run_at<S>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        node: UnitLoad,
        depth: usize,
    ) -> TransferResult<usize>
    where
        S: WarehouseSnapshot + ?Sized,
    {
        self.rebase(uow, node, depth)
    }

    fn rebase<S>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        mut node: UnitLoad,
        depth: usize,
    ) -> TransferResult<usize>
    where
        S: WarehouseSnapshot + ?Sized,
    {
        let max_depth = uow.max_carrier_depth();
        if depth > max_depth {
            tracing::error!(
                label = node.label_id(),
                max_depth,
                "cannot transfer unit load with more than {max_depth} carriers"
            );
            return Err(TransferError::CarrierMaxDepthExceeded { max_depth });
        }

        node.place_at(self.destination, self.index);
        tracing::debug!(label = node.label_id(), depth, "rebased unit load");

        uow.journal(JournalEntry {
            entry_id: Uuid::now_v7(),
            moved: node.id(),
            moved_label: node.label_id().to_string(),
            root: self.root,
            source: self.source,
            destination: self.destination,
            activity_code: self.activity_code.to_string(),
            actor: self.actor,
            comment: self.comment.to_string(),
            occurred_at: self.occurred_at,
        });

        let node_id = node.id();
        let label = node.label_id().to_string();
        uow.stage(node);

        let mut rebased = 1;
        for child in uow.children(node_id)? {
            if child.id() == node_id {
                tracing::error!(label = %label, "self reference detected, unit load is its own carrier");
                uow.report(DataAnomaly::SelfCarrier {
                    unit_load: node_id,
                    label: label.clone(),
                });
                continue;
            }
            rebased += self.rebase(uow, child, depth + 1)?;
        }

        Ok(rebased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWarehouse;

    #[test]
    fn subtree_is_rebased_pre_order_with_one_entry_per_node() {
        let warehouse = FakeWarehouse::new();
        let l1 = warehouse.add_location("L1");
        let l2 = warehouse.add_location("L2");
        let root = warehouse.add_unit_load(UnitLoad::new("R", l1).with_carrier_flag(true));
        let a = warehouse.add_unit_load(UnitLoad::new("A", l1).carried_by(root).with_carrier_flag(true));
        let a1 = warehouse.add_unit_load(UnitLoad::new("A1", l1).carried_by(a));

        let mut uow = UnitOfWork::new(&warehouse, 10);
        let propagation =
            Propagation::new(&uow, root, l1, RebaseTarget::Location(l2), UserId::new())
                .unwrap()
                .with_index(Some(2))
                .with_activity("RELOC", "aisle swap");
        let node = uow.unit_load(root).unwrap();
        assert_eq!(propagation.run(&mut uow, node).unwrap(), 3);

        let moved: Vec<UnitLoadId> = uow.journal_entries().iter().map(|e| e.moved).collect();
        assert_eq!(moved, vec![root, a, a1]);
        assert!(uow.journal_entries().iter().all(|e| {
            e.root == root && e.source == l1 && e.destination == l2 && e.activity_code == "RELOC"
        }));
        for id in [root, a, a1] {
            let ul = uow.unit_load(id).unwrap();
            assert_eq!(ul.location(), l2);
            assert_eq!(ul.index(), Some(2));
        }
    }

    #[test]
    fn depth_is_checked_before_touching_the_offending_node() {
        let warehouse = FakeWarehouse::new();
        let l1 = warehouse.add_location("L1");
        let l2 = warehouse.add_location("L2");
        let root = warehouse.add_unit_load(UnitLoad::new("R", l1));
        let child = warehouse.add_unit_load(UnitLoad::new("C", l1).carried_by(root));
        let grandchild = warehouse.add_unit_load(UnitLoad::new("G", l1).carried_by(child));

        let mut uow = UnitOfWork::new(&warehouse, 1);
        let propagation =
            Propagation::new(&uow, root, l1, RebaseTarget::Location(l2), UserId::new()).unwrap();
        let node = uow.unit_load(root).unwrap();
        let err = propagation.run(&mut uow, node).unwrap_err();

        assert_eq!(err, TransferError::CarrierMaxDepthExceeded { max_depth: 1 });
        assert_eq!(uow.unit_load(grandchild).unwrap().location(), l1);
        assert_eq!(uow.journal_entries().len(), 2);
    }

    #[test]
    fn self_carried_node_is_reported_and_skipped() {
        let warehouse = FakeWarehouse::new();
        let l1 = warehouse.add_location("L1");
        let l2 = warehouse.add_location("L2");
        let id = UnitLoadId::new();
        warehouse.add_unit_load(UnitLoad::new("LOOP", l1).with_id(id).carried_by(id));

        let mut uow = UnitOfWork::new(&warehouse, 10);
        let propagation =
            Propagation::new(&uow, id, l1, RebaseTarget::Location(l2), UserId::new()).unwrap();
        let node = uow.unit_load(id).unwrap();

        assert_eq!(propagation.run(&mut uow, node).unwrap(), 1);
        assert_eq!(uow.journal_entries().len(), 1);
        assert_eq!(
            uow.anomalies(),
            &[DataAnomaly::SelfCarrier {
                unit_load: id,
                label: "LOOP".to_string()
            }]
        );
    }

    #[test]
    fn carrier_target_resolves_through_the_chain() {
        let warehouse = FakeWarehouse::new();
        let l1 = warehouse.add_location("L1");
        let stale = warehouse.add_location("STALE");
        let base = warehouse.add_unit_load(UnitLoad::new("B", l1).with_carrier_flag(true));
        let top = warehouse.add_unit_load(UnitLoad::new("T", stale).carried_by(base));

        let uow = UnitOfWork::new(&warehouse, 10);
        assert_eq!(RebaseTarget::CarrierOf(top).resolve(&uow).unwrap(), l1);
    }
}
