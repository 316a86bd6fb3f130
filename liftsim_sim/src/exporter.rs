//! JSON exporter for fleet replays.
//!
//! Exports periodic snapshots of every elevator so a run can be inspected
//! or replayed outside the simulator.

use liftsim_core::Elevator;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Tick number the frame was taken after
    pub tick: u64,

    /// Requests waiting for dispatch
    pub queue_len: usize,

    /// Every elevator, in enumeration order
    pub elevators: Vec<ElevatorFrame>,
}

/// State of one elevator in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevatorFrame {
    pub id: String,
    pub name: String,
    pub floor: i32,
    pub status: String,
    pub direction: String,
    pub load: u32,
    pub capacity: u32,
    pub targets: Vec<i32>,
}

impl From<&Elevator> for ElevatorFrame {
    fn from(elevator: &Elevator) -> Self {
        Self {
            id: elevator.id.to_string(),
            name: elevator.name.clone(),
            floor: elevator.current_floor,
            status: elevator.status.name().to_string(),
            direction: format!("{:?}", elevator.direction),
            load: elevator.current_load,
            capacity: elevator.capacity,
            targets: elevator.target_floors.clone(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
