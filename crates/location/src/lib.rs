//! Storage location domain: unit-load transfers and carrier hierarchies.
//!
//! The transfer engine moves unit loads between storage locations and stacks
//! unit loads onto carriers. Every public operation runs inside a
//! [`UnitOfWork`]: nothing becomes visible until the store commits the whole
//! changeset under optimistic concurrency control.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod ports;
pub mod propagate;
pub mod transfer;
pub mod unit_of_work;

#[cfg(test)]
mod testing;

pub use config::TransferConfig;
pub use error::{TransferError, TransferResult};
pub use model::{
    FixAssignment, LocationLockState, LockState, StockState, StockUnit, StorageLocation, UnitLoad,
};
pub use ports::{
    AnomalyLog, Collaborators, DataAnomaly, FixAssignmentLookup, PlacementHooks,
    ReservationManager, WarehouseSnapshot, WarehouseStore, WellKnownLocations,
};
pub use transfer::{TransferRequest, TransferService};
pub use unit_of_work::{Changeset, PlacementNotice, ReservationOp, UnitOfWork};
