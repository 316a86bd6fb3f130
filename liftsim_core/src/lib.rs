//! LiftSim Core - Elevator Fleet Simulation Engine
//!
//! This library simulates a fleet of elevators and assigns trip requests to
//! them with a simple nearest-idle / fewest-targets heuristic:
//! 1. **State Store**: the authoritative in-memory table, one lock per elevator
//! 2. **Motion Engine**: pure per-tick state machine (move, stop, doors, load)
//! 3. **Dispatch Engine**: FIFO request queue drained one request per cycle
//!
//! The [`fleet_runtime`] module wires the engines to a
//! [`liftsim_env::FleetContext`] and owns the periodic drivers.

pub mod config;
pub mod error;
pub mod events;
pub mod lift_model;
pub mod lift_store;
pub mod lift_motion;
pub mod lift_dispatch;
pub mod lift_generator;
pub mod lift_maintenance;
pub mod fleet_runtime;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use config::{FleetConfig, GeneratorConfig};
pub use error::FleetError;
pub use events::{ChannelObserver, FleetEvent, FleetObserver};
pub use lift_model::{Direction, Elevator, ElevatorPatch, ElevatorStatus, TripRequest};
pub use lift_store::ElevatorStore;
pub use lift_dispatch::{DispatchOutcome, RequestQueue, SelectionRule};
pub use lift_maintenance::{MaintenanceJournal, MaintenanceLog, MaintenanceStatus};
pub use fleet_runtime::{Fleet, FleetRuntime, TickReport};
