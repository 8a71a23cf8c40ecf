//! Lock and fixed-assignment policy for incoming unit loads.

use crate::error::{TransferError, TransferResult};
use crate::model::{FixAssignment, StorageLocation, UnitLoad};

/// Decide whether `location` accepts `unit_load`.
///
/// Pure check without side effects. `has_children` is the hierarchy answer for
/// `unit_load` and `fix_assignment` the first assignment of `location`.
pub fn can_accept(
    location: &StorageLocation,
    unit_load: &UnitLoad,
    has_children: bool,
    fix_assignment: Option<&FixAssignment>,
    ignore_lock: bool,
) -> TransferResult<()> {
    if !ignore_lock && !location.lock_state().accepts_placement() {
        return Err(TransferError::LocationLocked {
            location: location.name().to_string(),
            lock_state: location.lock_state(),
        });
    }

    let Some(assignment) = fix_assignment else {
        return Ok(());
    };

    if has_children {
        tracing::error!(
            label = unit_load.label_id(),
            location = location.name(),
            "carrier unit loads are not allowed on fixed locations"
        );
        return Err(TransferError::CarrierNotAllowedOnFixedLocation {
            location: location.name().to_string(),
        });
    }

    if let Some(stranger) = unit_load
        .stock_units()
        .iter()
        .find(|su| su.item_data() != assignment.item_data)
    {
        return Err(TransferError::WrongItemDataForFixAssignment {
            location: location.name().to_string(),
            expected_item: assignment.item_data,
            expected_number: assignment.item_number.clone(),
            found_item: stranger.item_data(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use stockyard_core::{Entity, ItemDataId, LocationId};

    use super::*;
    use crate::model::{LocationLockState, StockUnit};

    fn fixed_to(location: &StorageLocation, item: ItemDataId) -> FixAssignment {
        FixAssignment {
            location: location.id(),
            item_data: item,
            item_number: "ITEM-X".to_string(),
        }
    }

    #[test]
    fn locked_locations_reject_unless_overridden() {
        let location = StorageLocation::new("B-01").with_lock_state(LocationLockState::Inventory);
        let ul = UnitLoad::new("P-1", LocationId::new());

        let err = can_accept(&location, &ul, false, None, false).unwrap_err();
        assert_eq!(
            err,
            TransferError::LocationLocked {
                location: "B-01".to_string(),
                lock_state: LocationLockState::Inventory,
            }
        );
        assert!(can_accept(&location, &ul, false, None, true).is_ok());
    }

    #[test]
    fn retrieval_only_locations_accept() {
        let location = StorageLocation::new("B-02").with_lock_state(LocationLockState::RetrievalOnly);
        let ul = UnitLoad::new("P-1", LocationId::new());
        assert!(can_accept(&location, &ul, false, None, false).is_ok());
    }

    #[test]
    fn fixed_location_rejects_carriers_regardless_of_contents() {
        let item = ItemDataId::new();
        let location = StorageLocation::new("F-01");
        let assignment = fixed_to(&location, item);
        let ul = UnitLoad::new("P-1", LocationId::new()).with_stock_unit(StockUnit::new(item, 1));

        let err = can_accept(&location, &ul, true, Some(&assignment), false).unwrap_err();
        assert_eq!(
            err,
            TransferError::CarrierNotAllowedOnFixedLocation {
                location: "F-01".to_string()
            }
        );
    }

    #[test]
    fn fixed_location_rejects_foreign_items() {
        let item = ItemDataId::new();
        let other = ItemDataId::new();
        let location = StorageLocation::new("F-01");
        let assignment = fixed_to(&location, item);
        let ul = UnitLoad::new("P-1", LocationId::new())
            .with_stock_unit(StockUnit::new(item, 1))
            .with_stock_unit(StockUnit::new(other, 2));

        match can_accept(&location, &ul, false, Some(&assignment), false) {
            Err(TransferError::WrongItemDataForFixAssignment {
                expected_item,
                expected_number,
                found_item,
                ..
            }) => {
                assert_eq!(expected_item, item);
                assert_eq!(expected_number, "ITEM-X");
                assert_eq!(found_item, other);
            }
            other => panic!("expected wrong item rejection, got {other:?}"),
        }
    }

    #[test]
    fn fixed_location_accepts_matching_and_empty_loads() {
        let item = ItemDataId::new();
        let location = StorageLocation::new("F-01");
        let assignment = fixed_to(&location, item);
        let matching =
            UnitLoad::new("P-1", LocationId::new()).with_stock_unit(StockUnit::new(item, 5));
        let empty = UnitLoad::new("P-2", LocationId::new());

        assert!(can_accept(&location, &matching, false, Some(&assignment), false).is_ok());
        assert!(can_accept(&location, &empty, false, Some(&assignment), false).is_ok());
    }
}
