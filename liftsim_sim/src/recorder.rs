//! Event recorder - an observer that keeps every fleet event for assertions.

use liftsim_core::{FleetEvent, FleetObserver, MaintenanceLog};
use liftsim_env::{ElevatorId, EnvError};
use std::sync::{Arc, Mutex, PoisonError};

/// Stores every delivered event in order.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<FleetEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// All events, oldest first.
    pub fn events(&self) -> Vec<FleetEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of state updates seen for one elevator.
    pub fn updates_for(&self, id: ElevatorId) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, FleetEvent::ElevatorUpdated(e) if e.id == id))
            .count()
    }

    pub fn maintenance_logs(&self) -> Vec<MaintenanceLog> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FleetEvent::MaintenanceLogged(log) => Some(log),
                _ => None,
            })
            .collect()
    }

    pub fn trip_requests(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, FleetEvent::TripRequested(_)))
            .count()
    }
}

impl FleetObserver for EventRecorder {
    fn notify(&self, event: &FleetEvent) -> Result<(), EnvError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
