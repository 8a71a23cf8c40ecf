//! `stockyard-core`: foundation building blocks of the warehouse domain.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemDataId, LocationId, StockUnitId, UnitLoadId, UserId};
pub use version::{ExpectedVersion, Versioned};
