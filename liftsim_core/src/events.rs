//! State-change notifications for external collaborators.
//!
//! Persistence and real-time broadcast live outside the engine. They see the
//! fleet only through [`FleetObserver`]: every store update emits the full
//! elevator state, fire-and-forget.
//!
//! ```text
//!  ElevatorStore::update ──► StatusHook(s) ──► FleetObserver(s)
//!                                               ├─ ChannelObserver ─► persistence
//!                                               └─ ChannelObserver ─► broadcast
//! ```

use crate::lift_maintenance::MaintenanceLog;
use crate::lift_model::{Elevator, TripRequest};
use liftsim_env::EnvError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Event emitted by the fleet engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FleetEvent {
    /// A new elevator joined the fleet
    ElevatorCreated(Elevator),

    /// Full state after a store update
    ElevatorUpdated(Elevator),

    /// An elevator entered Maintenance or Error
    MaintenanceLogged(MaintenanceLog),

    /// A manual trip request was accepted (historical record)
    TripRequested(TripRequest),
}

impl FleetEvent {
    /// Returns the elevator carried by the event, if any.
    pub fn elevator(&self) -> Option<&Elevator> {
        match self {
            FleetEvent::ElevatorCreated(e) | FleetEvent::ElevatorUpdated(e) => Some(e),
            _ => None,
        }
    }

    /// Short event name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FleetEvent::ElevatorCreated(_) => "ElevatorCreated",
            FleetEvent::ElevatorUpdated(_) => "ElevatorUpdated",
            FleetEvent::MaintenanceLogged(_) => "MaintenanceLogged",
            FleetEvent::TripRequested(_) => "TripRequested",
        }
    }
}

/// Receiver of fleet events.
///
/// Called while the per-elevator lock is held, so events for one elevator
/// arrive in update order. Implementations must not block and must not call
/// back into the store. Failures should be returned as errors; a panic is
/// caught and logged by the store, but the event is lost for that observer.
pub trait FleetObserver: Send + Sync {
    /// Delivers one event. Errors are logged by the caller and otherwise ignored.
    fn notify(&self, event: &FleetEvent) -> Result<(), EnvError>;
}

/// Observer that forwards events over an unbounded channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<FleetEvent>,
}

impl ChannelObserver {
    /// Creates the observer and the receiving end for the consumer task.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FleetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FleetObserver for ChannelObserver {
    fn notify(&self, event: &FleetEvent) -> Result<(), EnvError> {
        self.tx
            .send(event.clone())
            .map_err(|_| EnvError::closed("fleet events"))
    }
}
