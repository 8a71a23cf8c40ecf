//! Lifecycle terminators: transfers that take a unit load out of stock.

use stockyard_core::{UnitLoadId, UserId};

use crate::error::TransferResult;
use crate::ports::WarehouseStore;
use crate::transfer::{TransferRequest, TransferService};

impl<S> TransferService<S>
where
    S: WarehouseStore,
{
    /// Send `unit_load` to the trash location and mark it for deletion.
    ///
    /// The trash lock state is ignored and a reservation is always taken. The
    /// load and all its stock units end up locked `GoingToDelete` with stock
    /// state `Deletable`; the label gets a unique suffix so the original
    /// label can be printed again.
    pub fn retire(&self, actor: UserId, unit_load: UnitLoadId) -> TransferResult<()> {
        let trash = self.collaborators().well_known.trash_location()?;
        let request = TransferRequest::new().ignore_lock(true).reserve(true);

        let mut uow = self.begin();
        self.stage_transfer(&mut uow, actor, trash, unit_load, &request)?;

        let mut ul = uow.unit_load(unit_load)?;
        let original_label = ul.label_id().to_string();
        ul.mark_retired(&self.config().retired_label_separator);
        tracing::info!(
            label = %original_label,
            retired_label = ul.label_id(),
            "retired unit load"
        );
        uow.stage(ul);

        self.commit(uow)
    }

    /// Send `unit_load` to the clearing location with default transfer options.
    pub fn clear(&self, actor: UserId, unit_load: UnitLoadId) -> TransferResult<()> {
        let clearing = self.collaborators().well_known.clearing_location()?;
        self.transfer_unit_load(actor, clearing, unit_load)
    }
}
