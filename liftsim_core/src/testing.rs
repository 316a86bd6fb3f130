//! Manual clock used by the engine's unit tests.

use async_trait::async_trait;
use liftsim_env::FleetContext;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic context: time moves only when a test says so.
pub struct ManualContext {
    seed: u64,
    now: Mutex<Duration>,
}

impl ManualContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            now: Mutex::new(Duration::ZERO),
        }
    }

    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[async_trait]
impl FleetContext for ManualContext {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn spawn<F>(&self, _name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }

    fn derive_rng(&self, stream: u64) -> Box<dyn RngCore + Send> {
        Box::new(ChaCha8Rng::seed_from_u64(self.seed.wrapping_mul(0x9e3779b97f4a7c15) ^ stream))
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
