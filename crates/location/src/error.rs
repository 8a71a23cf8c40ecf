//! Transfer error taxonomy.
//!
//! Every variant rejects the request that produced it; none is process-fatal.
//! Rejections carry enough context (location name, offending item, configured
//! limits) for the caller to act on.

use thiserror::Error;

use stockyard_core::{DomainError, ItemDataId, LocationId, UnitLoadId};
use stockyard_events::JournalError;

use crate::model::LocationLockState;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The destination lock state forbids placement and the caller did not override.
    #[error("storage location {location} is locked ({lock_state})")]
    LocationLocked {
        location: String,
        lock_state: LocationLockState,
    },

    #[error("carrier unit loads are not allowed on fixed location {location}")]
    CarrierNotAllowedOnFixedLocation { location: String },

    #[error(
        "location {location} is fixed to item {expected_number} ({expected_item}), found item {found_item}"
    )]
    WrongItemDataForFixAssignment {
        location: String,
        expected_item: ItemDataId,
        expected_number: String,
        found_item: ItemDataId,
    },

    #[error("cannot transfer unit load with more than {max_depth} carriers")]
    CarrierMaxDepthExceeded { max_depth: usize },

    #[error("unit load {label} cannot be placed on itself")]
    CarrierSelfReference { label: String },

    /// Optimistic version check failed; the caller should retry.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("unit load {0} not found")]
    UnitLoadNotFound(UnitLoadId),

    #[error("storage location {0} not found")]
    LocationNotFound(LocationId),

    #[error("well-known location '{0}' is not configured")]
    WellKnownLocationMissing(String),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("reservation failed: {0}")]
    Reservation(String),

    #[error("placement hook failed: {0}")]
    Hook(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error(transparent)]
    Domain(DomainError),
}

impl TransferError {
    /// True when retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::ConcurrentModification(_))
    }
}

impl From<DomainError> for TransferError {
    fn from(value: DomainError) -> Self {
        match value {
            conflict @ DomainError::VersionConflict { .. } => {
                TransferError::ConcurrentModification(conflict.to_string())
            }
            other => TransferError::Domain(other),
        }
    }
}
