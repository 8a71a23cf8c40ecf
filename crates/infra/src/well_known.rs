use std::sync::Arc;

use stockyard_core::{Entity, LocationId};
use stockyard_location::{TransferConfig, TransferError, TransferResult, WellKnownLocations};

use crate::warehouse::InMemoryWarehouse;

/// Resolves the trash and clearing roles by the location names configured
/// in [`TransferConfig`].
#[derive(Debug)]
pub struct NamedLocations {
    warehouse: Arc<InMemoryWarehouse>,
    trash: String,
    clearing: String,
}

impl NamedLocations {
    pub fn new(warehouse: Arc<InMemoryWarehouse>, config: &TransferConfig) -> Self {
        Self {
            warehouse,
            trash: config.trash_location.clone(),
            clearing: config.clearing_location.clone(),
        }
    }

    fn resolve(&self, name: &str) -> TransferResult<LocationId> {
        self.warehouse
            .location_by_name(name)?
            .map(|location| location.id())
            .ok_or_else(|| TransferError::WellKnownLocationMissing(name.to_string()))
    }
}

impl WellKnownLocations for NamedLocations {
    fn trash_location(&self) -> TransferResult<LocationId> {
        self.resolve(&self.trash)
    }

    fn clearing_location(&self) -> TransferResult<LocationId> {
        self.resolve(&self.clearing)
    }
}
