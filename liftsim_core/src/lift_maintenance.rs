//! Maintenance logging, decoupled from the generic update path.
//!
//! The store runs every registered [`StatusHook`] after a merge that changed
//! an elevator's status. [`MaintenanceHook`] turns transitions *into*
//! Maintenance or Error into exactly one [`MaintenanceLog`], which then flows
//! out through the normal observer fan-out. [`MaintenanceJournal`] is an
//! in-memory observer that keeps those logs and tracks their resolution.

use crate::error::FleetError;
use crate::events::{FleetEvent, FleetObserver};
use crate::lift_model::{Elevator, ElevatorStatus};
use crate::lift_store::lock;
use indexmap::IndexMap;
use liftsim_env::{ElevatorId, EnvError, FleetContext, LogId};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Random stream used for log ids.
const LOG_ID_STREAM: u64 = 3;

/// Lifecycle of a maintenance log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, MaintenanceStatus::Pending | MaintenanceStatus::InProgress)
    }
}

/// Record created when an elevator goes out of service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub id: LogId,
    pub elevator_id: ElevatorId,
    pub elevator_name: String,
    pub status: MaintenanceStatus,
    pub description: String,
    pub reported_by: String,
    pub notes: Option<String>,
    pub created_at: Duration,
}

/// A status change observed by the store, after the merge.
#[derive(Debug, Clone, Copy)]
pub struct StatusTransition<'a> {
    pub before: &'a Elevator,
    pub after: &'a Elevator,
}

impl StatusTransition<'_> {
    /// True if this update moved the elevator into `status`.
    pub fn entered(&self, status: ElevatorStatus) -> bool {
        self.before.status != status && self.after.status == status
    }
}

/// Post-update hook keyed on status transitions.
pub trait StatusHook: Send + Sync {
    /// Returns an event to publish alongside the state update, if any.
    fn on_transition(&self, transition: &StatusTransition<'_>) -> Option<FleetEvent>;
}

/// Auto-generated description for an out-of-service status.
pub fn describe(status: ElevatorStatus) -> Option<&'static str> {
    match status {
        ElevatorStatus::Maintenance => Some("Switched to maintenance mode."),
        ElevatorStatus::Error => Some("Elevator malfunction."),
        _ => None,
    }
}

/// Creates a maintenance log for every transition into Maintenance or Error.
pub struct MaintenanceHook<Ctx: FleetContext> {
    context: Arc<Ctx>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl<Ctx: FleetContext> MaintenanceHook<Ctx> {
    pub fn new(context: Arc<Ctx>) -> Self {
        let rng = Mutex::new(context.derive_rng(LOG_ID_STREAM));
        Self { context, rng }
    }
}

impl<Ctx: FleetContext> StatusHook for MaintenanceHook<Ctx> {
    fn on_transition(&self, transition: &StatusTransition<'_>) -> Option<FleetEvent> {
        let status = transition.after.status;
        if !transition.entered(status) {
            return None;
        }
        let description = describe(status)?;

        let id = {
            let mut rng = lock(&self.rng);
            LogId::from_rng(&mut **rng)
        };

        Some(FleetEvent::MaintenanceLogged(MaintenanceLog {
            id,
            elevator_id: transition.after.id,
            elevator_name: transition.after.name.clone(),
            status: MaintenanceStatus::Pending,
            description: description.to_string(),
            reported_by: "system".to_string(),
            notes: None,
            created_at: self.context.now(),
        }))
    }
}

/// In-memory store of maintenance logs, fed as a fleet observer.
#[derive(Default)]
pub struct MaintenanceJournal {
    logs: Mutex<IndexMap<LogId, MaintenanceLog>>,
}

impl MaintenanceJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// All logs, oldest first.
    pub fn logs(&self) -> Vec<MaintenanceLog> {
        lock(&self.logs).values().cloned().collect()
    }

    pub fn get(&self, id: LogId) -> Result<MaintenanceLog, FleetError> {
        lock(&self.logs).get(&id).cloned().ok_or(FleetError::LogNotFound(id))
    }

    /// Logs for one elevator, oldest first.
    pub fn for_elevator(&self, elevator_id: ElevatorId) -> Vec<MaintenanceLog> {
        lock(&self.logs)
            .values()
            .filter(|log| log.elevator_id == elevator_id)
            .cloned()
            .collect()
    }

    /// Pending or in-progress logs.
    pub fn open_logs(&self) -> Vec<MaintenanceLog> {
        lock(&self.logs)
            .values()
            .filter(|log| log.status.is_open())
            .cloned()
            .collect()
    }

    /// Moves a log to `status`, optionally attaching notes.
    pub fn set_status(
        &self,
        id: LogId,
        status: MaintenanceStatus,
        notes: Option<String>,
    ) -> Result<MaintenanceLog, FleetError> {
        let mut logs = lock(&self.logs);
        let log = logs.get_mut(&id).ok_or(FleetError::LogNotFound(id))?;
        log.status = status;
        if notes.is_some() {
            log.notes = notes;
        }
        Ok(log.clone())
    }

    pub fn len(&self) -> usize {
        lock(&self.logs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FleetObserver for MaintenanceJournal {
    fn notify(&self, event: &FleetEvent) -> Result<(), EnvError> {
        if let FleetEvent::MaintenanceLogged(log) = event {
            lock(&self.logs).insert(log.id, log.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualContext;

    fn elevator(status: ElevatorStatus) -> Elevator {
        let mut e = Elevator::new(ElevatorId::from_seed(4), "D", 10, 1, Duration::ZERO);
        e.status = status;
        e
    }

    #[test]
    fn test_hook_logs_entry_into_maintenance() {
        let ctx = ManualContext::shared(1);
        ctx.advance(Duration::from_secs(12));
        let hook = MaintenanceHook::new(ctx);

        let before = elevator(ElevatorStatus::Idle);
        let after = elevator(ElevatorStatus::Maintenance);
        let event = hook.on_transition(&StatusTransition { before: &before, after: &after });

        match event {
            Some(FleetEvent::MaintenanceLogged(log)) => {
                assert_eq!(log.elevator_id, after.id);
                assert_eq!(log.status, MaintenanceStatus::Pending);
                assert_eq!(log.description, "Switched to maintenance mode.");
                assert_eq!(log.created_at, Duration::from_secs(12));
            }
            other => panic!("expected maintenance log, got {:?}", other),
        }
    }

    #[test]
    fn test_hook_ignores_other_transitions() {
        let hook = MaintenanceHook::new(ManualContext::shared(1));

        let idle = elevator(ElevatorStatus::Idle);
        let moving = elevator(ElevatorStatus::Moving);
        let error = elevator(ElevatorStatus::Error);

        assert!(hook.on_transition(&StatusTransition { before: &idle, after: &moving }).is_none());
        // Leaving Error is not logged
        assert!(hook.on_transition(&StatusTransition { before: &error, after: &idle }).is_none());
        // Error -> Error is not a transition
        assert!(hook.on_transition(&StatusTransition { before: &error, after: &error }).is_none());
    }

    #[test]
    fn test_hook_log_ids_follow_seed() {
        let before = elevator(ElevatorStatus::Moving);
        let after = elevator(ElevatorStatus::Error);
        let id_of = |seed| match MaintenanceHook::new(ManualContext::shared(seed))
            .on_transition(&StatusTransition { before: &before, after: &after })
        {
            Some(FleetEvent::MaintenanceLogged(log)) => log.id,
            _ => unreachable!(),
        };

        assert_eq!(id_of(9), id_of(9));
        assert_ne!(id_of(9), id_of(10));
    }

    #[test]
    fn test_journal_tracks_resolution() {
        let journal = MaintenanceJournal::new();
        let hook = MaintenanceHook::new(ManualContext::shared(2));
        let before = elevator(ElevatorStatus::Idle);
        let after = elevator(ElevatorStatus::Maintenance);
        let event = hook
            .on_transition(&StatusTransition { before: &before, after: &after })
            .unwrap();

        journal.notify(&event).unwrap();
        journal
            .notify(&FleetEvent::ElevatorUpdated(after.clone()))
            .unwrap();
        assert_eq!(journal.len(), 1);

        let log = journal.logs()[0].clone();
        assert_eq!(journal.open_logs().len(), 1);

        let done = journal
            .set_status(log.id, MaintenanceStatus::Completed, Some("cable replaced".into()))
            .unwrap();
        assert_eq!(done.status, MaintenanceStatus::Completed);
        assert_eq!(done.notes.as_deref(), Some("cable replaced"));
        assert!(journal.open_logs().is_empty());
        assert_eq!(journal.for_elevator(after.id).len(), 1);
    }

    #[test]
    fn test_journal_unknown_log() {
        let journal = MaintenanceJournal::new();
        let id = LogId::new();
        assert_eq!(
            journal.set_status(id, MaintenanceStatus::Cancelled, None),
            Err(FleetError::LogNotFound(id))
        );
    }
}
