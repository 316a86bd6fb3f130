//! LiftSim Deterministic Simulation Harness
//!
//! This crate runs the fleet engine in a controlled environment where every
//! run is reproducible from a single seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: a virtual clock that moves one tick interval per step
//! - **Scheduling**: generator, dispatch and clock run in a fixed order
//!   instead of as concurrent loops
//! - **Randomness**: passenger exchange, synthetic requests and ids are all
//!   derived from the master seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimContext (virtual clock + ChaCha8 streams)         │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                            │                                │
//! │  ┌─────────────────────────▼──────────────────────────┐     │
//! │  │ Fleet<SimContext>: store, queue, dispatcher, hooks │     │
//! │  └─────────────────────────┬──────────────────────────┘     │
//! │              observers     │                                │
//! │       ┌────────────────────┴───────────────┐                │
//! │  ┌────▼─────────┐                 ┌────────▼──────────┐     │
//! │  │ EventRecorder│                 │ MaintenanceJournal│     │
//! │  └──────────────┘                 └───────────────────┘     │
//! │        invariant checks after every tick ─► SimExport       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use liftsim_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 4).run(ScenarioId::RushHour);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod recorder;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::{ElevatorFrame, SimExport, SimFrame};
pub use recorder::EventRecorder;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
