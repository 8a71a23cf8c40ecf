//! Optimistic concurrency primitives for persisted records.

use crate::error::{DomainError, DomainResult};

/// A record carrying a monotonically increasing version stamp.
///
/// The persistence layer bumps the stamp on every committed write; a writer
/// that read an older stamp loses the race and has to retry.
pub trait Versioned {
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (fresh inserts, migrations, etc.).
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn of<V: Versioned>(record: &V) -> Self {
        ExpectedVersion::Exact(record.version())
    }

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        match self {
            ExpectedVersion::Exact(expected) if expected != actual => {
                Err(DomainError::VersionConflict { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stamp(u64);

    impl Versioned for Stamp {
        fn version(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn exact_version_rejects_stale_reads() {
        let expected = ExpectedVersion::of(&Stamp(3));
        assert!(expected.check(3).is_ok());
        assert_eq!(
            expected.check(4),
            Err(DomainError::VersionConflict {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn any_matches_everything() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(u64::MAX));
    }
}
