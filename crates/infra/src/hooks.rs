//! Placement hook implementations.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use stockyard_core::{LocationId, UnitLoadId};
use stockyard_location::{PlacementHooks, PlacementNotice, TransferError, TransferResult};

/// Hooks for locations without custom behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlacementHooks;

impl PlacementHooks for NoopPlacementHooks {
    fn on_removed(&self, _location: LocationId, _unit_load: UnitLoadId) -> TransferResult<()> {
        Ok(())
    }

    fn on_placed(&self, _location: LocationId, _unit_load: UnitLoadId) -> TransferResult<()> {
        Ok(())
    }
}

/// Records every notification it receives; can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingPlacementHooks {
    notices: Mutex<Vec<PlacementNotice>>,
    fail: AtomicBool,
}

impl RecordingPlacementHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<PlacementNotice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    fn push(&self, notice: PlacementNotice) -> TransferResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransferError::Hook(format!("hook refused {notice:?}")));
        }
        self.notices
            .lock()
            .map_err(|_| TransferError::Hook("lock poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

impl PlacementHooks for RecordingPlacementHooks {
    fn on_removed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()> {
        self.push(PlacementNotice::Removed {
            location,
            unit_load,
        })
    }

    fn on_placed(&self, location: LocationId, unit_load: UnitLoadId) -> TransferResult<()> {
        self.push(PlacementNotice::Placed {
            location,
            unit_load,
        })
    }
}
