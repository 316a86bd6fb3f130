//! Error types for the simulation harness.

use liftsim_core::FleetError;
use thiserror::Error;

/// Reasons a scenario run fails.
#[derive(Debug, Error)]
pub enum SimError {
    /// A fleet operation the scenario relies on was rejected
    #[error("Fleet error: {0}")]
    Fleet(#[from] FleetError),

    /// A state invariant was broken after a tick
    #[error("Invariant violated at t={time_secs:.1}s: {message}")]
    Invariant { time_secs: f64, message: String },

    /// A scenario-specific expectation did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The run length is negative, NaN or too large
    #[error("Invalid run duration: {0}s")]
    InvalidDuration(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}
