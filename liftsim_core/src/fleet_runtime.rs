//! Fleet Runtime - wires the engines to an environment context.
//!
//! [`Fleet`] is the facade external callers use: elevator lifecycle, status
//! overrides, manual requests, and the three periodic operations (tick,
//! dispatch, generate). [`FleetRuntime`] drives those operations from async
//! loops that only ever wait through [`FleetContext::sleep`], so the same
//! code runs on tokio or on a virtual clock.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Fleet<Ctx>                          │
//! │   clock loop ──► tick() ──► step() per elevator ─┐           │
//! │                                                  ▼           │
//! │   dispatch loop ──► Dispatcher ──────────► ElevatorStore ──► observers
//! │                        ▲                         │           │
//! │   generator loop ──► RequestQueue ◄── request_trip()         │
//! │                                          MaintenanceHook ◄───┘
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use liftsim_core::{Fleet, FleetConfig, FleetRuntime};
//! use liftsim_env::TokioContext;
//!
//! let fleet = Arc::new(Fleet::new(TokioContext::shared(), FleetConfig::default())?);
//! fleet.create_elevator("A", 10)?;
//! let runtime = FleetRuntime::spawn(fleet.clone(), true);
//! ```

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::events::{FleetEvent, FleetObserver};
use crate::lift_dispatch::{DispatchOutcome, Dispatcher, RequestQueue};
use crate::lift_generator::{RequestGenerator, GENERATOR_STREAM};
use crate::lift_maintenance::{MaintenanceHook, MaintenanceJournal, MaintenanceStatus};
use crate::lift_model::{Direction, Elevator, ElevatorPatch, ElevatorStatus, TripRequest};
use crate::lift_motion::{step, Transition};
use crate::lift_store::{lock, ElevatorStore};
use liftsim_env::{ElevatorId, FleetContext, LogId};
use rand::RngCore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Random stream used for passenger exchange.
pub const MOTION_STREAM: u64 = 1;

/// Random stream used for elevator ids.
pub const ELEVATOR_ID_STREAM: u64 = 4;

/// What one clock tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,

    /// Elevators evaluated
    pub evaluated: usize,

    /// Elevators whose state changed
    pub applied: usize,

    /// Elevators forced into Error by an out-of-bounds move
    pub faults: Vec<ElevatorId>,
}

/// An elevator fleet bound to an environment context.
pub struct Fleet<Ctx: FleetContext> {
    context: Arc<Ctx>,
    config: FleetConfig,
    store: Arc<ElevatorStore>,
    dispatcher: Dispatcher,
    generator: RequestGenerator,
    motion_rng: Mutex<Box<dyn RngCore + Send>>,
    id_rng: Mutex<Box<dyn RngCore + Send>>,
    tick_count: AtomicU64,
}

impl<Ctx: FleetContext> Fleet<Ctx> {
    /// Creates an empty fleet. Fails if `config` is invalid.
    pub fn new(context: Arc<Ctx>, config: FleetConfig) -> Result<Self, FleetError> {
        config.validate()?;

        let store = ElevatorStore::shared();
        store.add_hook(Arc::new(MaintenanceHook::new(context.clone())));

        let generator = RequestGenerator::new(&config, context.derive_rng(GENERATOR_STREAM));
        let motion_rng = Mutex::new(context.derive_rng(MOTION_STREAM));
        let id_rng = Mutex::new(context.derive_rng(ELEVATOR_ID_STREAM));

        info!(
            "Fleet ready: floors [{}, {}], tick {:?}, dispatch {:?}",
            config.min_floor, config.max_floor, config.tick_interval, config.dispatch_interval
        );

        Ok(Self {
            context,
            config,
            store,
            dispatcher: Dispatcher::new(RequestQueue::shared()),
            generator,
            motion_rng,
            id_rng,
            tick_count: AtomicU64::new(0),
        })
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ElevatorStore> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<RequestQueue> {
        self.dispatcher.queue()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub fn add_observer(&self, observer: Arc<dyn FleetObserver>) {
        self.store.add_observer(observer);
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Creates an idle, empty elevator at the default floor.
    pub fn create_elevator(&self, name: &str, capacity: u32) -> Result<Elevator, FleetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FleetError::EmptyName);
        }
        if capacity < 1 {
            return Err(FleetError::InvalidCapacity(capacity));
        }

        let id = ElevatorId::from_rng(&mut **lock(&self.id_rng));
        let elevator = Elevator::new(id, name, capacity, self.config.default_floor, self.context.now());
        self.store.insert(elevator.clone())?;

        info!("Elevator {} ({}) created at floor {}", elevator.name, id, elevator.current_floor);
        Ok(elevator)
    }

    /// Seeds the fleet from a snapshot. Every elevator starts a fresh phase.
    pub fn load(&self, elevators: impl IntoIterator<Item = Elevator>) -> usize {
        let now = self.context.now();
        self.store.load(elevators.into_iter().map(|mut elevator| {
            elevator.last_action_at = now;
            elevator.passenger_exchange_done = true;
            elevator
        }))
    }

    pub fn get(&self, id: ElevatorId) -> Result<Elevator, FleetError> {
        self.store.get(id)
    }

    pub fn list(&self) -> Vec<Elevator> {
        self.store.list()
    }

    pub fn list_available(&self) -> Vec<Elevator> {
        self.store.list_available()
    }

    /// Status override.
    ///
    /// Taking an elevator out of service also drops its targets and direction;
    /// the maintenance log is created by the store hook.
    pub fn set_status(&self, id: ElevatorId, status: ElevatorStatus) -> Result<Elevator, FleetError> {
        let mut patch = ElevatorPatch::new().status(status).action_at(self.context.now());
        if status.is_out_of_service() {
            patch = patch.targets(Vec::new()).direction(Direction::Idle);
        }
        let elevator = self.store.update(id, patch)?;
        info!("[{}] Status set to {}", elevator.name, status);
        Ok(elevator)
    }

    /// Completes a maintenance log and puts its elevator back in service.
    pub fn resolve_maintenance(
        &self,
        journal: &MaintenanceJournal,
        log_id: LogId,
        notes: Option<String>,
    ) -> Result<Elevator, FleetError> {
        let log = journal.set_status(log_id, MaintenanceStatus::Completed, notes)?;
        self.set_status(log.elevator_id, ElevatorStatus::Idle)
    }

    // ========================================================================
    // REQUESTS
    // ========================================================================

    /// Manual trip request. Both floors must lie within the building.
    ///
    /// Returns false if the request was dropped as a same-floor trip.
    pub fn request_trip(&self, from_floor: i32, to_floor: i32) -> Result<bool, FleetError> {
        for floor in [from_floor, to_floor] {
            if !self.config.contains_floor(floor) {
                return Err(FleetError::FloorOutOfRange {
                    floor,
                    min: self.config.min_floor,
                    max: self.config.max_floor,
                });
            }
        }

        let request = TripRequest::new(from_floor, to_floor);
        self.store.publish(&FleetEvent::TripRequested(request));
        Ok(self.enqueue(request))
    }

    pub fn enqueue(&self, request: TripRequest) -> bool {
        self.queue().enqueue(request)
    }

    /// Enqueues one synthetic batch; returns how many requests were queued.
    pub fn generate_requests(&self) -> usize {
        self.generator
            .generate_batch()
            .into_iter()
            .filter(|request| self.enqueue(*request))
            .count()
    }

    // ========================================================================
    // PERIODIC OPERATIONS
    // ========================================================================

    /// Advances every elevator by one state-machine step.
    ///
    /// Each elevator is evaluated independently; a failure on one never
    /// stops the others.
    pub fn tick(&self) -> TickReport {
        let now = self.context.now();
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        let mut rng = lock(&self.motion_rng);
        for id in self.store.ids() {
            report.evaluated += 1;

            let mut fault = None;
            let result = self.store.modify(id, |elevator| {
                let transition = step(elevator, now, &self.config, &mut **rng);
                if let Transition::OutOfBounds { attempted_floor, .. } = &transition {
                    fault = Some((elevator.name.clone(), *attempted_floor));
                }
                transition.into_patch()
            });

            match result {
                Ok(Some(_)) => report.applied += 1,
                Ok(None) => {}
                Err(err) => warn!("Tick {}: skipping elevator {}: {}", tick, id, err),
            }

            if let Some((name, floor)) = fault {
                error!(
                    "[{}] Attempted to move to floor {} outside [{}, {}], forcing Error",
                    name, floor, self.config.min_floor, self.config.max_floor
                );
                report.faults.push(id);
            }
        }
        report
    }

    /// Runs one dispatch cycle.
    pub fn dispatch_cycle(&self) -> DispatchOutcome {
        self.dispatcher.run_cycle(&self.store)
    }
}

// ============================================================================
// DRIVERS
// ============================================================================

/// Handle on the periodic drivers of a fleet.
///
/// Loops stop at their next wake-up after [`FleetRuntime::stop`].
pub struct FleetRuntime {
    stop: Arc<AtomicBool>,
}

impl FleetRuntime {
    /// Spawns the clock and dispatch loops, plus the generator if asked.
    pub fn spawn<Ctx: FleetContext>(fleet: Arc<Fleet<Ctx>>, with_generator: bool) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let context = fleet.context().clone();

        context.spawn("fleet-clock", clock_loop(fleet.clone(), stop.clone()));
        context.spawn("fleet-dispatch", dispatch_loop(fleet.clone(), stop.clone()));
        if with_generator {
            context.spawn("fleet-generator", generator_loop(fleet, stop.clone()));
        }

        info!("Fleet runtime started (generator: {})", with_generator);
        Self { stop }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

impl Drop for FleetRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn clock_loop<Ctx: FleetContext>(fleet: Arc<Fleet<Ctx>>, stop: Arc<AtomicBool>) {
    let interval = fleet.config().tick_interval;
    loop {
        fleet.context().sleep(interval).await;
        if stop.load(Ordering::Acquire) {
            break;
        }
        fleet.tick();
    }
}

async fn dispatch_loop<Ctx: FleetContext>(fleet: Arc<Fleet<Ctx>>, stop: Arc<AtomicBool>) {
    let interval = fleet.config().dispatch_interval;
    loop {
        fleet.context().sleep(interval).await;
        if stop.load(Ordering::Acquire) {
            break;
        }
        fleet.dispatch_cycle();
    }
}

async fn generator_loop<Ctx: FleetContext>(fleet: Arc<Fleet<Ctx>>, stop: Arc<AtomicBool>) {
    let config = fleet.config().generator.clone();
    fleet.context().sleep(config.startup_delay).await;
    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }
        fleet.generate_requests();
        fleet.context().sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelObserver;
    use crate::lift_dispatch::SelectionRule;
    use crate::testing::ManualContext;
    use liftsim_env::TokioContext;
    use std::time::Duration;

    fn fleet(seed: u64) -> (Arc<ManualContext>, Fleet<ManualContext>) {
        let ctx = ManualContext::shared(seed);
        let fleet = Fleet::new(ctx.clone(), FleetConfig::default()).unwrap();
        (ctx, fleet)
    }

    /// Ticks once per second until `done` holds or `max_ticks` runs out.
    fn run_until(
        ctx: &ManualContext,
        fleet: &Fleet<ManualContext>,
        max_ticks: usize,
        done: impl Fn(&Fleet<ManualContext>) -> bool,
    ) -> bool {
        for _ in 0..max_ticks {
            ctx.advance(Duration::from_secs(1));
            fleet.tick();
            if done(fleet) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FleetConfig::default().with_floors(5, 1);
        assert!(matches!(
            Fleet::new(ManualContext::shared(1), config),
            Err(FleetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_elevator_defaults() {
        let (_ctx, fleet) = fleet(1);
        let e = fleet.create_elevator("A", 8).unwrap();

        assert_eq!(e.current_floor, 1);
        assert_eq!(e.status, ElevatorStatus::Idle);
        assert_eq!(e.direction, Direction::Idle);
        assert_eq!(e.current_load, 0);
        assert!(e.target_floors.is_empty());
        assert!(e.passenger_exchange_done);
        assert_eq!(fleet.get(e.id).unwrap(), e);
    }

    #[test]
    fn test_create_elevator_validation() {
        let (_ctx, fleet) = fleet(1);
        fleet.create_elevator("A", 8).unwrap();

        assert_eq!(fleet.create_elevator("  ", 8), Err(FleetError::EmptyName));
        assert_eq!(fleet.create_elevator("B", 0), Err(FleetError::InvalidCapacity(0)));
        assert_eq!(
            fleet.create_elevator("A", 8),
            Err(FleetError::DuplicateName("A".to_string()))
        );
        assert_eq!(fleet.list().len(), 1);
    }

    #[test]
    fn test_elevator_ids_follow_seed() {
        let (_, a) = fleet(5);
        let (_, b) = fleet(5);
        assert_eq!(a.create_elevator("A", 8).unwrap().id, b.create_elevator("A", 8).unwrap().id);
    }

    #[test]
    fn test_load_resets_phase() {
        let (ctx, fleet) = fleet(1);
        ctx.advance(Duration::from_secs(30));

        let mut e = Elevator::new(ElevatorId::from_seed(9), "Z", 10, 4, Duration::ZERO);
        e.passenger_exchange_done = false;
        assert_eq!(fleet.load([e.clone()]), 1);

        let loaded = fleet.get(e.id).unwrap();
        assert_eq!(loaded.last_action_at, Duration::from_secs(30));
        assert!(loaded.passenger_exchange_done);
    }

    #[test]
    fn test_maintenance_override_clears_targets_and_logs_once() {
        let (_ctx, fleet) = fleet(2);
        let journal = MaintenanceJournal::shared();
        fleet.add_observer(journal.clone());

        let e = fleet.create_elevator("A", 8).unwrap();
        fleet.enqueue(TripRequest::new(5, 9));
        fleet.dispatch_cycle();
        fleet.tick();
        assert_eq!(fleet.get(e.id).unwrap().status, ElevatorStatus::Moving);

        let updated = fleet.set_status(e.id, ElevatorStatus::Maintenance).unwrap();
        assert_eq!(updated.status, ElevatorStatus::Maintenance);
        assert!(updated.target_floors.is_empty());
        assert_eq!(updated.direction, Direction::Idle);
        assert_eq!(journal.len(), 1);

        // Same status again: no second log
        fleet.set_status(e.id, ElevatorStatus::Maintenance).unwrap();
        assert_eq!(journal.len(), 1);

        let log = journal.logs()[0].clone();
        assert_eq!(log.elevator_name, "A");
        assert_eq!(log.description, "Switched to maintenance mode.");
        assert_eq!(log.reported_by, "system");
    }

    #[test]
    fn test_out_of_service_elevator_is_frozen() {
        let (ctx, fleet) = fleet(2);
        let e = fleet.create_elevator("A", 8).unwrap();
        let frozen = fleet.set_status(e.id, ElevatorStatus::Error).unwrap();
        fleet.enqueue(TripRequest::new(3, 4));

        assert!(matches!(fleet.dispatch_cycle(), DispatchOutcome::Requeued { .. }));
        assert!(!run_until(&ctx, &fleet, 20, |f| f.get(e.id).unwrap() != frozen));
        assert_eq!(fleet.queue().len(), 1);
    }

    #[test]
    fn test_resolve_maintenance_returns_to_idle() {
        let (_ctx, fleet) = fleet(3);
        let journal = MaintenanceJournal::shared();
        fleet.add_observer(journal.clone());

        let e = fleet.create_elevator("A", 8).unwrap();
        fleet.set_status(e.id, ElevatorStatus::Maintenance).unwrap();
        let log_id = journal.logs()[0].id;

        let back = fleet
            .resolve_maintenance(&journal, log_id, Some("doors realigned".into()))
            .unwrap();
        assert_eq!(back.status, ElevatorStatus::Idle);
        assert_eq!(journal.get(log_id).unwrap().status, MaintenanceStatus::Completed);
        assert!(journal.open_logs().is_empty());
    }

    #[test]
    fn test_set_status_unknown_elevator() {
        let (_ctx, fleet) = fleet(1);
        let id = ElevatorId::from_seed(77);
        assert_eq!(
            fleet.set_status(id, ElevatorStatus::Maintenance),
            Err(FleetError::ElevatorNotFound(id))
        );
    }

    #[test]
    fn test_request_trip_validates_bounds() {
        let (_ctx, fleet) = fleet(1);
        let (observer, mut rx) = ChannelObserver::new();
        fleet.add_observer(Arc::new(observer));

        assert_eq!(
            fleet.request_trip(0, 51),
            Err(FleetError::FloorOutOfRange { floor: 51, min: -3, max: 50 })
        );
        assert!(fleet.queue().is_empty());
        assert!(rx.try_recv().is_err());

        assert_eq!(fleet.request_trip(-3, 50), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            FleetEvent::TripRequested(TripRequest::new(-3, 50))
        );
        assert_eq!(fleet.request_trip(7, 7), Ok(false));
        assert_eq!(fleet.queue().len(), 1);
    }

    #[test]
    fn test_full_trip() {
        let (ctx, fleet) = fleet(4);
        let e = fleet.create_elevator("A", 10).unwrap();

        fleet.request_trip(2, 4).unwrap();
        assert!(matches!(
            fleet.dispatch_cycle(),
            DispatchOutcome::Assigned { rule: SelectionRule::NearestIdle, .. }
        ));

        let arrived = run_until(&ctx, &fleet, 60, |f| {
            let e = f.get(e.id).unwrap();
            e.current_floor == 4 && e.status == ElevatorStatus::Idle && e.target_floors.is_empty()
        });
        assert!(arrived);

        let e = fleet.get(e.id).unwrap();
        assert_eq!(e.direction, Direction::Idle);
        assert!(e.current_load <= e.capacity);
    }

    #[test]
    fn test_tick_stays_put_without_work() {
        let (ctx, fleet) = fleet(4);
        fleet.create_elevator("A", 10).unwrap();
        ctx.advance(Duration::from_secs(1));

        let report = fleet.tick();
        assert_eq!(report.tick, 1);
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.applied, 0);
        assert!(report.faults.is_empty());
    }

    struct PanickingObserver;

    impl FleetObserver for PanickingObserver {
        fn notify(&self, _event: &FleetEvent) -> Result<(), liftsim_env::EnvError> {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_panicking_observer_does_not_halt_tick() {
        let (ctx, fleet) = fleet(7);
        fleet.add_observer(Arc::new(PanickingObserver));

        let moving = |seed: u64, name: &str| {
            let mut e = Elevator::new(ElevatorId::from_seed(seed), name, 10, 1, Duration::ZERO);
            e.status = ElevatorStatus::Moving;
            e.direction = Direction::Up;
            e.target_floors = vec![5];
            e
        };
        let (a, b) = (moving(1, "A"), moving(2, "B"));
        fleet.load([a.clone(), b.clone()]);

        ctx.advance(fleet.config().time_per_floor);
        let report = fleet.tick();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.applied, 2);
        assert_eq!(fleet.get(a.id).unwrap().current_floor, 2);
        assert_eq!(fleet.get(b.id).unwrap().current_floor, 2);
    }

    #[test]
    fn test_out_of_bounds_forces_error() {
        let (ctx, fleet) = fleet(6);
        let journal = MaintenanceJournal::shared();
        fleet.add_observer(journal.clone());

        let mut e = Elevator::new(ElevatorId::from_seed(1), "Top", 10, 50, Duration::ZERO);
        e.status = ElevatorStatus::Moving;
        e.direction = Direction::Up;
        e.target_floors = vec![51];
        fleet.load([e.clone()]);

        ctx.advance(fleet.config().time_per_floor);
        let report = fleet.tick();
        assert_eq!(report.faults, vec![e.id]);

        let after = fleet.get(e.id).unwrap();
        assert_eq!(after.status, ElevatorStatus::Error);
        assert_eq!(after.current_floor, 50);
        assert!(after.target_floors.is_empty());

        let logs = journal.for_elevator(e.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].description, "Elevator malfunction.");
    }

    #[test]
    fn test_generate_requests_fills_queue() {
        let (_ctx, fleet) = fleet(8);
        let queued = fleet.generate_requests();
        assert!((1..=3).contains(&queued));
        assert_eq!(fleet.queue().len(), queued);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_serves_request() {
        let fleet = Arc::new(Fleet::new(TokioContext::shared(), FleetConfig::default()).unwrap());
        let a = fleet.create_elevator("A", 10).unwrap();
        let b = fleet.create_elevator("B", 10).unwrap();
        fleet.request_trip(3, 7).unwrap();

        let runtime = FleetRuntime::spawn(fleet.clone(), false);
        tokio::time::sleep(Duration::from_secs(120)).await;
        runtime.stop();

        assert!(fleet.queue().is_empty());
        let served: Vec<_> = [a.id, b.id]
            .iter()
            .map(|id| fleet.get(*id).unwrap())
            .filter(|e| e.current_floor == 7)
            .collect();
        assert_eq!(served.len(), 1);
        assert!(served[0].target_floors.is_empty());
        assert!(fleet.tick_count() >= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_generator_produces_load() {
        let fleet = Arc::new(Fleet::new(TokioContext::shared(), FleetConfig::default()).unwrap());
        fleet.create_elevator("A", 10).unwrap();
        let (observer, mut rx) = ChannelObserver::new();
        fleet.add_observer(Arc::new(observer));

        let runtime = FleetRuntime::spawn(fleet.clone(), true);
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(runtime);

        let mut updates = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, FleetEvent::ElevatorUpdated(_)) {
                updates += 1;
            }
        }
        assert!(updates > 0);
    }
}
