//! Common types for the LiftSim environment abstraction.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

/// Stable unique identifier of an elevator.
///
/// Assigned once at creation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElevatorId(pub Uuid);

impl ElevatorId {
    /// Creates a new random ElevatorId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an ElevatorId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Draws a v4 UUID from the given random stream.
    ///
    /// Used with [`crate::FleetContext::derive_rng`] so that ids are
    /// reproducible in simulation.
    pub fn from_rng(rng: &mut dyn RngCore) -> Self {
        Self(random_uuid(rng))
    }

    /// Creates a deterministic ElevatorId from a seed (for simulation fixtures).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElevatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElevatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Identifier of a maintenance log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub Uuid);

impl LogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_rng(rng: &mut dyn RngCore) -> Self {
        Self(random_uuid(rng))
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

fn random_uuid(rng: &mut dyn RngCore) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}
