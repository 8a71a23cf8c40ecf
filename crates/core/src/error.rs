//! Errors shared by every stockyard crate.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures that are independent of any particular warehouse operation.
///
/// Transfer rejections (locks, fixed assignments, carrier rules) live in
/// `stockyard-location`; this type covers bad input, broken record
/// invariants and stale versions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An input value was rejected before any record was read.
    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Writing a record would break a warehouse invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The stored version is not the one the writer read.
    #[error("version conflict (expected {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
