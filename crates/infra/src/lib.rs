//! Infrastructure layer: in-memory collaborators for the transfer engine.

pub mod anomaly;
pub mod fix_assignment;
pub mod hooks;
pub mod reservation;
pub mod services;
pub mod warehouse;
pub mod well_known;


pub use anomaly::InMemoryAnomalyLog;
pub use fix_assignment::InMemoryFixAssignments;
pub use hooks::{NoopPlacementHooks, RecordingPlacementHooks};
pub use reservation::InMemoryReservationManager;
pub use services::InMemoryServices;
pub use warehouse::InMemoryWarehouse;
pub use well_known::NamedLocations;
