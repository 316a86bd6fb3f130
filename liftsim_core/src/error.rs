//! Error types for the fleet engine.

use liftsim_env::{ElevatorId, EnvError, LogId};
use thiserror::Error;

/// Errors surfaced by fleet operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FleetError {
    /// Operation referenced an elevator the store does not know
    #[error("Elevator not found: {0}")]
    ElevatorNotFound(ElevatorId),

    /// Elevator names are unique across the fleet
    #[error("Elevator name already in use: {0}")]
    DuplicateName(String),

    #[error("Elevator name must not be empty")]
    EmptyName,

    #[error("Invalid capacity {0}: must be at least 1")]
    InvalidCapacity(u32),

    /// Requested floor lies outside the configured building
    #[error("Floor {floor} outside [{min}, {max}]")]
    FloorOutOfRange { floor: i32, min: i32, max: i32 },

    #[error("Maintenance log not found: {0}")]
    LogNotFound(LogId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Environment failure (notification delivery, context)
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),
}

impl FleetError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
