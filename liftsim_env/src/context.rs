//! Core environment context trait for the LiftSim fleet engine.

use async_trait::async_trait;
use rand::RngCore;
use std::future::Future;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the fleet engine can run
/// against a wall clock in production and a virtual clock in simulation.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `SimContext` - manual virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// For simulation, all methods that would normally introduce non-determinism
/// (time, randomness) are controlled by the implementation.
#[async_trait]
pub trait FleetContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Elevator phase timestamps (`last_action_at`) are expressed on this
    /// timeline. In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Derives an independent random stream.
    ///
    /// Each engine component asks for its own stream so that, in simulation,
    /// adding passengers does not perturb the request generator and vice versa.
    ///
    /// # Arguments
    /// * `stream` - A value combined with the global seed
    fn derive_rng(&self, stream: u64) -> Box<dyn RngCore + Send>;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
