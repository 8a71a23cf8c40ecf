//! Warehouse records touched by the transfer engine.
//!
//! Location membership is never stored on [`StorageLocation`]: the set of unit
//! loads at a location is a query over [`UnitLoad::location`], so a transfer
//! writes exactly one record per moved unit load.

use serde::{Deserialize, Serialize};

use stockyard_core::{Entity, ItemDataId, LocationId, StockUnitId, UnitLoadId, Versioned};

/// Lock state of a storage location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLockState {
    Open,
    /// Generally blocked, nothing goes in or out.
    Blocked,
    /// Scheduled for removal from the layout.
    GoingToDelete,
    /// Stock taking in progress.
    Inventory,
    /// Unit loads may leave but the location is not a regular put-away target.
    RetrievalOnly,
    /// Storage is blocked, the location only gives away unit loads.
    StorageLocked,
    Clearing,
}

impl LocationLockState {
    /// Numeric lock code as used by host systems and reports.
    pub fn code(self) -> u32 {
        match self {
            LocationLockState::Open => 0,
            LocationLockState::Blocked => 1,
            LocationLockState::GoingToDelete => 2,
            LocationLockState::Inventory => 5,
            LocationLockState::RetrievalOnly => 301,
            LocationLockState::StorageLocked => 302,
            LocationLockState::Clearing => 303,
        }
    }

    /// Only open and retrieval-only locations accept incoming unit loads.
    pub fn accepts_placement(self) -> bool {
        matches!(self, LocationLockState::Open | LocationLockState::RetrievalOnly)
    }
}

impl core::fmt::Display for LocationLockState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Lock state of a unit load or stock unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    NotLocked,
    Blocked,
    /// Terminal: the record waits for physical deletion.
    GoingToDelete,
}

/// Stock state of a unit load or stock unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    Incoming,
    OnStock,
    Picked,
    Shipped,
    /// Terminal: the record may be deleted.
    Deletable,
}

/// A storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    id: LocationId,
    name: String,
    lock_state: LocationLockState,
    version: u64,
}

impl StorageLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            lock_state: LocationLockState::Open,
            version: 0,
        }
    }

    pub fn with_id(mut self, id: LocationId) -> Self {
        self.id = id;
        self
    }

    pub fn with_lock_state(mut self, lock_state: LocationLockState) -> Self {
        self.lock_state = lock_state;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lock_state(&self) -> LocationLockState {
        self.lock_state
    }

    pub fn set_lock_state(&mut self, lock_state: LocationLockState) {
        self.lock_state = lock_state;
    }

    /// Persistence layer only: stamp the committed version.
    pub fn stamp_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Entity for StorageLocation {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }
}

impl Versioned for StorageLocation {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Stock of one item type on a unit load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
    id: StockUnitId,
    item_data: ItemDataId,
    quantity: i64,
    lock_state: LockState,
    stock_state: StockState,
}

impl StockUnit {
    pub fn new(item_data: ItemDataId, quantity: i64) -> Self {
        Self {
            id: StockUnitId::new(),
            item_data,
            quantity,
            lock_state: LockState::NotLocked,
            stock_state: StockState::OnStock,
        }
    }

    pub fn id(&self) -> StockUnitId {
        self.id
    }

    pub fn item_data(&self) -> ItemDataId {
        self.item_data
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn stock_state(&self) -> StockState {
        self.stock_state
    }

    fn mark_deletable(&mut self) {
        self.lock_state = LockState::GoingToDelete;
        self.stock_state = StockState::Deletable;
    }
}

/// A trackable physical unit of inventory (pallet, box, ...).
///
/// `carrier_id` is an identifier back-reference, never an owning pointer: all
/// hierarchy traversal goes through the store, bounded by the configured
/// maximum carrier depth. For a carried load `location` caches the effective
/// location inherited from its carrier chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLoad {
    id: UnitLoadId,
    label_id: String,
    location: LocationId,
    carrier_id: Option<UnitLoadId>,
    is_carrier: bool,
    index: Option<u32>,
    lock_state: LockState,
    stock_state: StockState,
    stock_units: Vec<StockUnit>,
    version: u64,
}

impl UnitLoad {
    pub fn new(label_id: impl Into<String>, location: LocationId) -> Self {
        Self {
            id: UnitLoadId::new(),
            label_id: label_id.into(),
            location,
            carrier_id: None,
            is_carrier: false,
            index: None,
            lock_state: LockState::NotLocked,
            stock_state: StockState::OnStock,
            stock_units: Vec::new(),
            version: 0,
        }
    }

    pub fn with_id(mut self, id: UnitLoadId) -> Self {
        self.id = id;
        self
    }

    pub fn with_stock_unit(mut self, stock_unit: StockUnit) -> Self {
        self.stock_units.push(stock_unit);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Seed a carrier link as found in existing data. No checks are applied.
    pub fn carried_by(mut self, carrier: UnitLoadId) -> Self {
        self.carrier_id = Some(carrier);
        self
    }

    /// Seed the carrier flag as found in existing data.
    pub fn with_carrier_flag(mut self, is_carrier: bool) -> Self {
        self.is_carrier = is_carrier;
        self
    }

    pub fn label_id(&self) -> &str {
        &self.label_id
    }

    /// The stored location. For carried loads this is the cached effective
    /// location of the carrier chain.
    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn carrier_id(&self) -> Option<UnitLoadId> {
        self.carrier_id
    }

    pub fn is_root(&self) -> bool {
        self.carrier_id.is_none()
    }

    pub fn is_carrier(&self) -> bool {
        self.is_carrier
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn stock_state(&self) -> StockState {
        self.stock_state
    }

    pub fn stock_units(&self) -> &[StockUnit] {
        &self.stock_units
    }

    /// Persistence layer only: stamp the committed version.
    pub fn stamp_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn place_at(&mut self, location: LocationId, index: Option<u32>) {
        self.location = location;
        if let Some(index) = index {
            self.index = Some(index);
        }
    }

    pub(crate) fn detach_from_carrier(&mut self) {
        self.carrier_id = None;
    }

    pub(crate) fn attach_to(&mut self, carrier: UnitLoadId, effective_location: LocationId) {
        self.carrier_id = Some(carrier);
        self.location = effective_location;
    }

    pub(crate) fn set_carrier_flag(&mut self, is_carrier: bool) {
        self.is_carrier = is_carrier;
    }

    /// Lock the load and its stock for deletion and free up its label.
    pub(crate) fn mark_retired(&mut self, separator: &str) {
        self.lock_state = LockState::GoingToDelete;
        self.stock_state = StockState::Deletable;
        self.label_id = format!("{}{}{}", self.label_id, separator, self.id);
        for stock_unit in &mut self.stock_units {
            stock_unit.mark_deletable();
        }
    }
}

impl Entity for UnitLoad {
    type Id = UnitLoadId;

    fn id(&self) -> UnitLoadId {
        self.id
    }
}

impl Versioned for UnitLoad {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Permanent binding of a storage location to exactly one item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixAssignment {
    pub location: LocationId,
    pub item_data: ItemDataId,
    /// Human-readable item number, reported in rejections.
    pub item_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_and_retrieval_locations_accept_placement() {
        let accepting: Vec<LocationLockState> = [
            LocationLockState::Open,
            LocationLockState::Blocked,
            LocationLockState::GoingToDelete,
            LocationLockState::Inventory,
            LocationLockState::RetrievalOnly,
            LocationLockState::StorageLocked,
            LocationLockState::Clearing,
        ]
        .into_iter()
        .filter(|s| s.accepts_placement())
        .collect();

        assert_eq!(
            accepting,
            vec![LocationLockState::Open, LocationLockState::RetrievalOnly]
        );
    }

    #[test]
    fn retirement_frees_label_and_locks_stock() {
        let location = LocationId::new();
        let mut ul = UnitLoad::new("P-100", location)
            .with_stock_unit(StockUnit::new(ItemDataId::new(), 4))
            .with_stock_unit(StockUnit::new(ItemDataId::new(), 9));

        ul.mark_retired("-X-");

        assert_eq!(ul.label_id(), format!("P-100-X-{}", ul.id()));
        assert_eq!(ul.lock_state(), LockState::GoingToDelete);
        assert_eq!(ul.stock_state(), StockState::Deletable);
        assert!(ul.stock_units().iter().all(|su| {
            su.lock_state() == LockState::GoingToDelete && su.stock_state() == StockState::Deletable
        }));
    }

    #[test]
    fn placement_keeps_index_when_unspecified() {
        let mut ul = UnitLoad::new("P-1", LocationId::new()).with_index(3);
        let target = LocationId::new();

        ul.place_at(target, None);
        assert_eq!(ul.location(), target);
        assert_eq!(ul.index(), Some(3));

        ul.place_at(target, Some(7));
        assert_eq!(ul.index(), Some(7));
    }
}
