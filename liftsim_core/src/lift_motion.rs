//! The "MOTION" Engine - per-elevator tick logic.
//!
//! [`step`] is a pure transition function: given one elevator, the current
//! context time and the fleet configuration it returns the patch to merge,
//! or nothing. The only impurity is the random stream used for the
//! passenger exchange, which the caller supplies.
//!
//! ```text
//!            targets            elapsed >= time_per_floor
//!   Idle ───────────► Moving ─────────────────────────┐
//!    ▲   (target here)   │ reached a target           │ next floor
//!    │        └────────► Stopped ◄────────┘            │
//!    │                   │                             │
//!    │                   ▼                             │
//! DoorClosed ◄──── DoorOpen (exchange once,           ─┘
//!          elapsed >= time_door_open)
//!
//!   Maintenance / Error: sink states, never left by the tick.
//! ```

use crate::config::FleetConfig;
use crate::lift_model::{Direction, Elevator, ElevatorPatch, ElevatorStatus};
use rand::Rng;
use std::time::Duration;

/// Result of evaluating one elevator for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing to do this tick
    Hold,

    /// Regular progress
    Advance(ElevatorPatch),

    /// The next floor would leave the building: the elevator is forced into
    /// Error with its targets cleared.
    OutOfBounds { attempted_floor: i32, patch: ElevatorPatch },
}

impl Transition {
    pub fn into_patch(self) -> Option<ElevatorPatch> {
        match self {
            Transition::Hold => None,
            Transition::Advance(patch) | Transition::OutOfBounds { patch, .. } => Some(patch),
        }
    }
}

/// Outcome of one door-open load exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub exited: u32,
    pub entered: u32,
    pub load: u32,
}

/// Evaluates one tick for one elevator.
pub fn step<R: Rng + ?Sized>(
    elevator: &Elevator,
    now: Duration,
    config: &FleetConfig,
    rng: &mut R,
) -> Transition {
    let elapsed = now.saturating_sub(elevator.last_action_at);

    match elevator.status {
        ElevatorStatus::Maintenance | ElevatorStatus::Error => Transition::Hold,
        ElevatorStatus::Idle => on_idle(elevator, now),
        ElevatorStatus::Moving => {
            if elapsed < config.time_per_floor {
                return Transition::Hold;
            }
            on_moving(elevator, now, config)
        }
        ElevatorStatus::Stopped => Transition::Advance(
            ElevatorPatch::new()
                .status(ElevatorStatus::DoorOpen)
                .action_at(now)
                .exchange_done(false),
        ),
        ElevatorStatus::DoorOpen => {
            let mut patch = ElevatorPatch::new();
            if !elevator.passenger_exchange_done {
                let exchange = exchange_passengers(elevator.current_load, elevator.capacity, rng);
                tracing::debug!(
                    "[{}] floor {}: {} out, {} in, load {}",
                    elevator.name,
                    elevator.current_floor,
                    exchange.exited,
                    exchange.entered,
                    exchange.load
                );
                patch = patch.load(exchange.load).exchange_done(true);
            }
            if elapsed >= config.time_door_open {
                patch = patch.status(ElevatorStatus::DoorClosed).action_at(now);
            }
            if patch.is_empty() {
                Transition::Hold
            } else {
                Transition::Advance(patch)
            }
        }
        ElevatorStatus::DoorClosed => {
            let mut patch = ElevatorPatch::new().status(ElevatorStatus::Idle);
            if elevator.target_floors.is_empty() {
                patch = patch.direction(Direction::Idle);
            }
            Transition::Advance(patch)
        }
    }
}

fn on_idle(elevator: &Elevator, now: Duration) -> Transition {
    let ordered = order_targets(elevator.current_floor, elevator.direction, &elevator.target_floors);
    let Some(&next) = ordered.first() else {
        return Transition::Hold;
    };

    if next == elevator.current_floor {
        return Transition::Advance(
            ElevatorPatch::new()
                .status(ElevatorStatus::Stopped)
                .targets(ordered[1..].to_vec())
                .action_at(now),
        );
    }

    Transition::Advance(
        ElevatorPatch::new()
            .status(ElevatorStatus::Moving)
            .direction(Direction::towards(elevator.current_floor, next))
            .targets(ordered)
            .action_at(now),
    )
}

fn on_moving(elevator: &Elevator, now: Duration, config: &FleetConfig) -> Transition {
    if elevator.direction == Direction::Idle {
        // Nothing to travel towards; let the Idle evaluation pick a direction
        return Transition::Advance(ElevatorPatch::new().status(ElevatorStatus::Idle));
    }

    let next_floor = elevator.current_floor + elevator.direction.delta();
    if !config.contains_floor(next_floor) {
        return Transition::OutOfBounds {
            attempted_floor: next_floor,
            patch: ElevatorPatch::new()
                .status(ElevatorStatus::Error)
                .direction(Direction::Idle)
                .targets(Vec::new())
                .action_at(now),
        };
    }

    let mut patch = ElevatorPatch::new().floor(next_floor).action_at(now);
    if elevator.has_target(next_floor) {
        let remaining = elevator
            .target_floors
            .iter()
            .copied()
            .filter(|&floor| floor != next_floor)
            .collect();
        patch = patch.status(ElevatorStatus::Stopped).targets(remaining);
    }
    Transition::Advance(patch)
}

/// Orders targets so the elevator finishes the floors ahead before reversing.
///
/// - The current floor, if targeted, comes first.
/// - With an established direction, floors ahead follow in ascending
///   distance, then floors behind in descending distance (closest last).
/// - Without a direction, floors are ordered by absolute distance.
///
/// Ties keep their existing relative order. Since a moving elevator stops at
/// every targeted floor it passes, the order among floors behind only decides
/// the direction taken after the reversal.
pub fn order_targets(current: i32, direction: Direction, targets: &[i32]) -> Vec<i32> {
    let distance = |floor: &i32| (floor - current).unsigned_abs();

    let mut ordered: Vec<i32> = targets.to_vec();
    match direction {
        Direction::Idle => {
            ordered.sort_by_key(distance);
        }
        Direction::Up | Direction::Down => {
            let sign = direction.delta();
            let (mut ahead, mut behind): (Vec<i32>, Vec<i32>) = targets
                .iter()
                .copied()
                .filter(|&floor| floor != current)
                .partition(|&floor| (floor - current) * sign > 0);
            ahead.sort_by_key(distance);
            behind.sort_by_key(|floor| std::cmp::Reverse(distance(floor)));

            ordered = targets.iter().copied().filter(|&floor| floor == current).collect();
            ordered.extend(ahead);
            ordered.extend(behind);
        }
    }
    ordered.dedup();
    ordered
}

/// One door-open exchange.
///
/// Exits are uniform over `[0, load]`; entries are uniform over
/// `[0, ceil(free / 2)]` where `free` is the space left after exits. The
/// result is clamped to `capacity`: an overloaded cabin sheds the excess,
/// which is counted as exits.
pub fn exchange_passengers<R: Rng + ?Sized>(load: u32, capacity: u32, rng: &mut R) -> Exchange {
    let mut exited = rng.gen_range(0..=load);
    let mut remaining = load - exited;
    if remaining > capacity {
        exited += remaining - capacity;
        remaining = capacity;
    }

    let free = capacity - remaining;
    let entered = if free > 0 {
        rng.gen_range(0..=free.div_ceil(2))
    } else {
        0
    };

    Exchange {
        exited,
        entered,
        load: remaining + entered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftsim_env::ElevatorId;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const T: Duration = Duration::from_secs(3);
    const DOOR: Duration = Duration::from_secs(5);

    fn config() -> FleetConfig {
        FleetConfig::default().with_timing(T, DOOR)
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn elevator_at(floor: i32, targets: &[i32]) -> Elevator {
        let mut e = Elevator::new(ElevatorId::from_seed(1), "A", 10, floor, Duration::ZERO);
        e.target_floors = targets.to_vec();
        e
    }

    fn apply(e: &mut Elevator, transition: Transition) {
        if let Some(patch) = transition.into_patch() {
            patch.apply_to(e);
        }
    }

    fn advance<R: Rng + ?Sized>(e: &mut Elevator, now: Duration, config: &FleetConfig, rng: &mut R) {
        let transition = step(e, now, config, rng);
        apply(e, transition);
    }

    #[test]
    fn test_idle_without_targets_holds() {
        let e = elevator_at(5, &[]);
        for secs in [0, 10, 1000] {
            assert_eq!(step(&e, Duration::from_secs(secs), &config(), &mut rng()), Transition::Hold);
        }
    }

    #[test]
    fn test_idle_tie_keeps_insertion_order() {
        // |5-8| == |5-2|: the first-listed target wins
        let mut e = elevator_at(5, &[8, 2]);
        advance(&mut e, Duration::ZERO, &config(), &mut rng());
        assert_eq!(e.status, ElevatorStatus::Moving);
        assert_eq!(e.direction, Direction::Up);

        advance(&mut e, T, &config(), &mut rng());
        assert_eq!(e.current_floor, 6);

        let mut e = elevator_at(5, &[2, 8]);
        advance(&mut e, Duration::ZERO, &config(), &mut rng());
        advance(&mut e, T, &config(), &mut rng());
        assert_eq!(e.direction, Direction::Down);
        assert_eq!(e.current_floor, 4);
    }

    #[test]
    fn test_moving_waits_for_time_per_floor() {
        let mut e = elevator_at(0, &[3]);
        advance(&mut e, Duration::ZERO, &config(), &mut rng());

        let early = step(&e, T - Duration::from_millis(1), &config(), &mut rng());
        assert_eq!(early, Transition::Hold);

        advance(&mut e, T, &config(), &mut rng());
        assert_eq!(e.current_floor, 1);
        assert_eq!(e.last_action_at, T);
    }

    #[test]
    fn test_idle_on_target_floor_stops_directly() {
        let mut e = elevator_at(4, &[4, 9]);
        advance(&mut e, Duration::from_secs(1), &config(), &mut rng());

        assert_eq!(e.status, ElevatorStatus::Stopped);
        assert_eq!(e.target_floors, vec![9]);
        assert_eq!(e.last_action_at, Duration::from_secs(1));
    }

    #[test]
    fn test_full_trip_cycle() {
        let cfg = config();
        let mut e = elevator_at(1, &[3]);
        let mut now = Duration::ZERO;
        let mut r = rng();

        advance(&mut e, now, &cfg, &mut r);
        assert_eq!(e.status, ElevatorStatus::Moving);

        now += T;
        advance(&mut e, now, &cfg, &mut r);
        assert_eq!((e.current_floor, e.status), (2, ElevatorStatus::Moving));

        now += T;
        advance(&mut e, now, &cfg, &mut r);
        assert_eq!((e.current_floor, e.status), (3, ElevatorStatus::Stopped));
        assert!(e.target_floors.is_empty());

        advance(&mut e, now, &cfg, &mut r);
        assert_eq!(e.status, ElevatorStatus::DoorOpen);
        assert!(!e.passenger_exchange_done);

        advance(&mut e, now, &cfg, &mut r);
        assert!(e.passenger_exchange_done);
        assert_eq!(e.status, ElevatorStatus::DoorOpen);

        now += DOOR;
        advance(&mut e, now, &cfg, &mut r);
        assert_eq!(e.status, ElevatorStatus::DoorClosed);

        advance(&mut e, now, &cfg, &mut r);
        assert_eq!(e.status, ElevatorStatus::Idle);
        assert_eq!(e.direction, Direction::Idle);
    }

    #[test]
    fn test_exchange_runs_once_per_door_open() {
        let mut e = elevator_at(2, &[]);
        e.status = ElevatorStatus::DoorOpen;
        e.current_load = 6;
        e.passenger_exchange_done = true;

        // Repeated ticks inside the door hold never touch the load again
        for ms in [0u64, 1000, 2000, 4999] {
            let transition = step(&e, Duration::from_millis(ms), &config(), &mut rng());
            assert_eq!(transition, Transition::Hold);
        }

        e.passenger_exchange_done = false;
        let first = step(&e, Duration::ZERO, &config(), &mut rng());
        apply(&mut e, first);
        assert!(e.passenger_exchange_done);
        let load_after = e.current_load;

        let second = step(&e, Duration::from_secs(1), &config(), &mut rng());
        assert_eq!(second, Transition::Hold);
        assert_eq!(e.current_load, load_after);
    }

    #[test]
    fn test_out_of_bounds_forces_error() {
        let cfg = config().with_floors(0, 10);
        let mut e = elevator_at(10, &[12]);
        e.status = ElevatorStatus::Moving;
        e.direction = Direction::Up;

        let transition = step(&e, T, &cfg, &mut rng());
        match &transition {
            Transition::OutOfBounds { attempted_floor, .. } => assert_eq!(*attempted_floor, 11),
            other => panic!("expected OutOfBounds, got {:?}", other),
        }

        apply(&mut e, transition);
        assert_eq!(e.status, ElevatorStatus::Error);
        assert_eq!(e.current_floor, 10);
        assert_eq!(e.direction, Direction::Idle);
        assert!(e.target_floors.is_empty());
    }

    #[test]
    fn test_sink_states_hold() {
        for status in [ElevatorStatus::Maintenance, ElevatorStatus::Error] {
            let mut e = elevator_at(3, &[7]);
            e.status = status;
            assert_eq!(step(&e, Duration::from_secs(100), &config(), &mut rng()), Transition::Hold);
        }
    }

    #[test]
    fn test_moving_without_direction_returns_to_idle() {
        let mut e = elevator_at(3, &[7]);
        e.status = ElevatorStatus::Moving;
        advance(&mut e, T, &config(), &mut rng());
        assert_eq!(e.status, ElevatorStatus::Idle);
        assert_eq!(e.current_floor, 3);
    }

    #[test]
    fn test_order_targets_finishes_ahead_first() {
        assert_eq!(order_targets(5, Direction::Up, &[2, 9, 7, 4]), vec![7, 9, 2, 4]);
        assert_eq!(order_targets(5, Direction::Down, &[2, 9, 7, 4]), vec![4, 2, 9, 7]);
        assert_eq!(order_targets(5, Direction::Up, &[3, 5]), vec![5, 3]);
        assert_eq!(order_targets(5, Direction::Idle, &[9, 4, 6]), vec![4, 6, 9]);
    }

    #[test]
    fn test_exchange_respects_capacity() {
        let mut r = rng();
        for _ in 0..500 {
            let x = exchange_passengers(7, 10, &mut r);
            assert!(x.exited <= 7);
            assert!(x.entered <= (3 + x.exited).div_ceil(2));
            assert!(x.load <= 10);
            assert_eq!(x.load, 7 - x.exited + x.entered);
        }

        // Overloaded snapshot sheds the excess
        let x = exchange_passengers(14, 10, &mut r);
        assert!(x.load <= 10);
        assert_eq!(x.load + x.exited, 14 + x.entered);
    }

    proptest! {
        #[test]
        fn prop_floor_stays_in_bounds(
            start in -3i32..=50,
            targets in proptest::collection::vec(-3i32..=50, 0..6),
            seed in any::<u64>(),
        ) {
            let cfg = config();
            let mut r = ChaCha8Rng::seed_from_u64(seed);
            let mut e = elevator_at(start, &targets);
            let mut now = Duration::ZERO;

            for _ in 0..400 {
                now += Duration::from_secs(1);
                advance(&mut e, now, &cfg, &mut r);
                prop_assert!(cfg.contains_floor(e.current_floor));
                prop_assert!(e.current_load <= e.capacity);
                prop_assert_ne!(e.status, ElevatorStatus::Error);
            }
        }

        #[test]
        fn prop_exchange_never_overfills(load in 0u32..40, capacity in 1u32..40, seed in any::<u64>()) {
            let mut r = ChaCha8Rng::seed_from_u64(seed);
            let x = exchange_passengers(load, capacity, &mut r);
            prop_assert!(x.load <= capacity);
            prop_assert!(x.exited <= load);
        }
    }
}
