use std::sync::Mutex;

use stockyard_location::{AnomalyLog, DataAnomaly};

/// Keeps reported data anomalies for later inspection and logs each one.
#[derive(Debug, Default)]
pub struct InMemoryAnomalyLog {
    entries: Mutex<Vec<DataAnomaly>>,
}

impl InMemoryAnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DataAnomaly> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AnomalyLog for InMemoryAnomalyLog {
    fn record(&self, anomaly: DataAnomaly) {
        match &anomaly {
            DataAnomaly::SelfCarrier { unit_load, label } => {
                tracing::warn!(%unit_load, label = %label, "unit load carries itself");
            }
        }
        match self.entries.lock() {
            Ok(mut entries) => entries.push(anomaly),
            Err(_) => tracing::error!("anomaly log poisoned, dropping entry"),
        }
    }
}
