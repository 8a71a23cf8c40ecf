//! Identity of persisted warehouse records.

/// A record with a stable identity.
///
/// Storage locations and unit loads are looked up, versioned and compared by
/// id; their attributes change with every transfer.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
