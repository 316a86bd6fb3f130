//! Elevator data model: the simulation entity, partial updates, trip requests.

use liftsim_env::ElevatorId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// ENUMS
// ============================================================================

/// Direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    /// Floor delta of one move in this direction.
    pub fn delta(&self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Idle => 0,
        }
    }

    /// Direction that leads from `from` towards `to`.
    pub fn towards(from: i32, to: i32) -> Self {
        if to > from {
            Direction::Up
        } else if to < from {
            Direction::Down
        } else {
            Direction::Idle
        }
    }
}

/// Operational status of an elevator.
///
/// `Maintenance` and `Error` are sink states for the tick logic: only an
/// explicit status override moves an elevator out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElevatorStatus {
    Idle,
    Moving,
    Stopped,
    DoorOpen,
    DoorClosed,
    Maintenance,
    Error,
}

impl ElevatorStatus {
    /// Returns true for statuses that take an elevator out of dispatch.
    pub fn is_out_of_service(&self) -> bool {
        matches!(self, ElevatorStatus::Maintenance | ElevatorStatus::Error)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElevatorStatus::Idle => "Idle",
            ElevatorStatus::Moving => "Moving",
            ElevatorStatus::Stopped => "Stopped",
            ElevatorStatus::DoorOpen => "DoorOpen",
            ElevatorStatus::DoorClosed => "DoorClosed",
            ElevatorStatus::Maintenance => "Maintenance",
            ElevatorStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for ElevatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ElevatorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "idle" => Ok(ElevatorStatus::Idle),
            "moving" => Ok(ElevatorStatus::Moving),
            "stopped" => Ok(ElevatorStatus::Stopped),
            "dooropen" => Ok(ElevatorStatus::DoorOpen),
            "doorclosed" => Ok(ElevatorStatus::DoorClosed),
            "maintenance" => Ok(ElevatorStatus::Maintenance),
            "error" => Ok(ElevatorStatus::Error),
            _ => Err(format!("Unknown elevator status: {}", s)),
        }
    }
}

// ============================================================================
// ELEVATOR
// ============================================================================

/// A simulated elevator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elevator {
    /// Stable identifier, immutable after creation
    pub id: ElevatorId,

    /// Display label, unique in the fleet
    pub name: String,

    pub current_floor: i32,
    pub direction: Direction,
    pub status: ElevatorStatus,

    /// Occupants currently inside
    pub current_load: u32,

    /// Maximum occupants (>= 1)
    pub capacity: u32,

    /// Floors still to visit; duplicate-free, re-ordered on every Idle evaluation
    pub target_floors: Vec<i32>,

    /// Context time at which the current phase began
    pub last_action_at: Duration,

    /// Set once the load exchange ran for the current DoorOpen phase
    pub passenger_exchange_done: bool,
}

impl Elevator {
    /// Creates an idle, empty elevator parked at `floor`.
    pub fn new(id: ElevatorId, name: impl Into<String>, capacity: u32, floor: i32, now: Duration) -> Self {
        Self {
            id,
            name: name.into(),
            current_floor: floor,
            direction: Direction::Idle,
            status: ElevatorStatus::Idle,
            current_load: 0,
            capacity,
            target_floors: Vec::new(),
            last_action_at: now,
            passenger_exchange_done: true,
        }
    }

    /// Free space left in the cabin.
    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_load)
    }

    pub fn has_target(&self, floor: i32) -> bool {
        self.target_floors.contains(&floor)
    }

    pub fn is_available(&self) -> bool {
        !self.status.is_out_of_service()
    }
}

/// Set union of `existing` and `floors`, keeping first-seen order.
pub fn merge_targets(existing: &[i32], floors: &[i32]) -> Vec<i32> {
    let mut merged = Vec::with_capacity(existing.len() + floors.len());
    for &floor in existing.iter().chain(floors) {
        if !merged.contains(&floor) {
            merged.push(floor);
        }
    }
    merged
}

// ============================================================================
// PARTIAL UPDATE
// ============================================================================

/// A partial update: only the `Some` fields replace the current state.
///
/// `id`, `name` and `capacity` are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElevatorPatch {
    pub current_floor: Option<i32>,
    pub direction: Option<Direction>,
    pub status: Option<ElevatorStatus>,
    pub current_load: Option<u32>,
    pub target_floors: Option<Vec<i32>>,
    pub last_action_at: Option<Duration>,
    pub passenger_exchange_done: Option<bool>,
}

impl ElevatorPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: ElevatorStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn floor(mut self, floor: i32) -> Self {
        self.current_floor = Some(floor);
        self
    }

    pub fn load(mut self, load: u32) -> Self {
        self.current_load = Some(load);
        self
    }

    pub fn targets(mut self, targets: Vec<i32>) -> Self {
        self.target_floors = Some(targets);
        self
    }

    pub fn action_at(mut self, now: Duration) -> Self {
        self.last_action_at = Some(now);
        self
    }

    pub fn exchange_done(mut self, done: bool) -> Self {
        self.passenger_exchange_done = Some(done);
        self
    }

    /// Returns true if the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the patch into `elevator`.
    pub fn apply_to(self, elevator: &mut Elevator) {
        if let Some(floor) = self.current_floor {
            elevator.current_floor = floor;
        }
        if let Some(direction) = self.direction {
            elevator.direction = direction;
        }
        if let Some(status) = self.status {
            elevator.status = status;
        }
        if let Some(load) = self.current_load {
            elevator.current_load = load;
        }
        if let Some(targets) = self.target_floors {
            elevator.target_floors = merge_targets(&[], &targets);
        }
        if let Some(at) = self.last_action_at {
            elevator.last_action_at = at;
        }
        if let Some(done) = self.passenger_exchange_done {
            elevator.passenger_exchange_done = done;
        }
    }
}

// ============================================================================
// TRIP REQUEST
// ============================================================================

/// A pending trip: origin floor to destination floor.
///
/// Transient: consumed once its floors are merged into an elevator's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripRequest {
    pub from_floor: i32,
    pub to_floor: i32,
}

impl TripRequest {
    pub fn new(from_floor: i32, to_floor: i32) -> Self {
        Self { from_floor, to_floor }
    }

    /// A request is a real trip only if it changes floors.
    pub fn is_trip(&self) -> bool {
        self.from_floor != self.to_floor
    }

    pub fn floors(&self) -> [i32; 2] {
        [self.from_floor, self.to_floor]
    }
}

impl std::fmt::Display for TripRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.from_floor, self.to_floor)
    }
}
