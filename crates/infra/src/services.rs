//! In-memory wiring of a complete transfer service (dev/test).

use std::sync::Arc;

use stockyard_events::InMemoryJournal;
use stockyard_location::{Collaborators, TransferConfig, TransferService};

use crate::anomaly::InMemoryAnomalyLog;
use crate::fix_assignment::InMemoryFixAssignments;
use crate::hooks::RecordingPlacementHooks;
use crate::reservation::InMemoryReservationManager;
use crate::warehouse::InMemoryWarehouse;
use crate::well_known::NamedLocations;

/// A transfer service plus handles to every in-memory collaborator behind it.
#[derive(Debug, Clone)]
pub struct InMemoryServices {
    pub warehouse: Arc<InMemoryWarehouse>,
    pub journal: Arc<InMemoryJournal>,
    pub reservations: Arc<InMemoryReservationManager>,
    pub fix_assignments: Arc<InMemoryFixAssignments>,
    pub hooks: Arc<RecordingPlacementHooks>,
    pub anomalies: Arc<InMemoryAnomalyLog>,
    pub transfers: Arc<TransferService<Arc<InMemoryWarehouse>>>,
}

impl InMemoryServices {
    pub fn new(config: TransferConfig) -> Self {
        let journal = Arc::new(InMemoryJournal::new());
        let reservations = Arc::new(InMemoryReservationManager::new());
        let warehouse = Arc::new(InMemoryWarehouse::new(
            reservations.clone(),
            journal.clone(),
        ));
        let fix_assignments = Arc::new(InMemoryFixAssignments::new());
        let hooks = Arc::new(RecordingPlacementHooks::new());
        let anomalies = Arc::new(InMemoryAnomalyLog::new());

        let collaborators = Collaborators {
            fix_assignments: fix_assignments.clone(),
            hooks: hooks.clone(),
            well_known: Arc::new(NamedLocations::new(warehouse.clone(), &config)),
            anomalies: anomalies.clone(),
        };
        let transfers = Arc::new(TransferService::new(
            warehouse.clone(),
            collaborators,
            config,
        ));

        tracing::debug!("in-memory transfer services wired");
        Self {
            warehouse,
            journal,
            reservations,
            fix_assignments,
            hooks,
            anomalies,
            transfers,
        }
    }
}

impl Default for InMemoryServices {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}
