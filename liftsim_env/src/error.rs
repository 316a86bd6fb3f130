//! Error types for the LiftSim environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The receiving side of a notification channel has gone away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// An external collaborator refused or failed to accept an event
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),
}

impl EnvError {
    /// Creates a channel-closed error.
    pub fn closed(channel: impl Into<String>) -> Self {
        Self::ChannelClosed(channel.into())
    }

    /// Creates a delivery error.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::DeliveryFailed(msg.into())
    }
}
