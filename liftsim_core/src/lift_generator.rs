//! Synthetic load source.
//!
//! Fabricates small random batches of trip requests for demo and soak runs.
//! Origin and destination are uniform over the configured floor range and
//! never equal.

use crate::config::FleetConfig;
use crate::lift_model::TripRequest;
use crate::lift_store::lock;
use rand::{Rng, RngCore};
use std::sync::Mutex;

/// Random stream used by the generator.
pub const GENERATOR_STREAM: u64 = 2;

pub struct RequestGenerator {
    min_floor: i32,
    max_floor: i32,
    max_batch: u32,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RequestGenerator {
    pub fn new(config: &FleetConfig, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            min_floor: config.min_floor,
            max_floor: config.max_floor,
            max_batch: config.generator.max_batch.max(1),
            rng: Mutex::new(rng),
        }
    }

    /// Produces 1..=max_batch requests.
    pub fn generate_batch(&self) -> Vec<TripRequest> {
        let mut rng = lock(&self.rng);
        let count = rng.gen_range(1..=self.max_batch);
        (0..count).map(|_| self.sample(&mut **rng)).collect()
    }

    /// One request with `from != to`.
    ///
    /// The destination is drawn from the range minus one floor, then shifted
    /// past the origin, which keeps it uniform over the remaining floors.
    pub fn sample(&self, rng: &mut dyn RngCore) -> TripRequest {
        let from = rng.gen_range(self.min_floor..=self.max_floor);
        let mut to = rng.gen_range(self.min_floor..self.max_floor);
        if to >= from {
            to += 1;
        }
        TripRequest::new(from, to)
    }
}
