//! Tracing and logging setup shared by stockyard binaries and tests.

/// Initialize process-wide tracing with the default settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(&crate::tracing::TracingConfig::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, TracingConfig, init_for_tests};
