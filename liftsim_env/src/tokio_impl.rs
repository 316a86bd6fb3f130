//! Production implementation of FleetContext using Tokio.

use crate::FleetContext;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the tokio clock (so a paused test runtime can drive it),
/// randomness from the operating system.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "spawning background task");
        tokio::spawn(future);
    }

    fn derive_rng(&self, _stream: u64) -> Box<dyn RngCore + Send> {
        // Production streams are independent draws from OS entropy
        Box::new(StdRng::from_entropy())
    }

    fn seed(&self) -> u64 {
        0
    }
}
