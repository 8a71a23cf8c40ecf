//! Journal event contract.

use chrono::{DateTime, Utc};

/// A fact recorded in the warehouse journal.
///
/// Type name and schema version are persisted next to the payload, so
/// readers can tell payload generations apart after the struct evolves.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted type name, e.g. `inventory.unit_load.transferred`.
    const EVENT_TYPE: &'static str;

    /// Bumped on every incompatible payload change.
    const VERSION: u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }
}
