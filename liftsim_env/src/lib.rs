//! LiftSim Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the LiftSim fleet
//! engine to run in both **Production** (tokio, wall clock) and
//! **Simulation** (virtual clock, seeded RNG) environments.
//!
//! Everything the engine would otherwise take from the outside world is
//! routed through [`FleetContext`]:
//! - Time (`now()`, `sleep()`)
//! - Task spawning (`spawn()`)
//! - Randomness (`derive_rng()`)
//!
//! By deriving all entropy from a single 64-bit seed, any simulation run
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use liftsim_env::FleetContext;
//!
//! async fn clock_loop<Ctx: FleetContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(1000)).await;
//!         tick(ctx.now());
//!     }
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::FleetContext;
pub use types::{ElevatorId, LogId};
pub use error::EnvError;
pub use tokio_impl::TokioContext;
