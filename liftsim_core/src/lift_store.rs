//! The Elevator State Store - single source of truth during runtime.
//!
//! Each elevator sits behind its own lock, so updates to one id are applied
//! strictly in order while different elevators never contend. All mutation
//! funnels through [`ElevatorStore::modify`] (and its convenience wrapper
//! [`ElevatorStore::update`]):
//!
//! 1. lock the elevator's entry
//! 2. compute and merge the partial update
//! 3. run status hooks (maintenance logs) if the status changed
//! 4. fan the full new state out to every observer
//!
//! Observers run under the entry lock so that notifications for one elevator
//! leave in update order.

use crate::error::FleetError;
use crate::events::{FleetEvent, FleetObserver};
use crate::lift_maintenance::{StatusHook, StatusTransition};
use crate::lift_model::{Elevator, ElevatorPatch};
use indexmap::IndexMap;
use liftsim_env::ElevatorId;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Locks a mutex, recovering the data if another holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

type Entry = Arc<Mutex<Elevator>>;

/// Table slot. The name is fixed at creation, so it is kept outside the
/// entry lock for uniqueness checks.
struct Slot {
    name: String,
    state: Entry,
}

impl Slot {
    fn new(elevator: Elevator) -> Self {
        Self {
            name: elevator.name.clone(),
            state: Arc::new(Mutex::new(elevator)),
        }
    }
}

/// In-memory table of every elevator, in creation order.
#[derive(Default)]
pub struct ElevatorStore {
    elevators: RwLock<IndexMap<ElevatorId, Slot>>,
    hooks: RwLock<Vec<Arc<dyn StatusHook>>>,
    observers: RwLock<Vec<Arc<dyn FleetObserver>>>,
}

impl ElevatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped store for sharing between drivers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers a hook run after status-changing merges.
    pub fn add_hook(&self, hook: Arc<dyn StatusHook>) {
        write(&self.hooks).push(hook);
    }

    /// Registers an external collaborator (persistence, broadcast, ...).
    pub fn add_observer(&self, observer: Arc<dyn FleetObserver>) {
        write(&self.observers).push(observer);
    }

    /// Adds a new elevator and announces it.
    pub fn insert(&self, elevator: Elevator) -> Result<(), FleetError> {
        {
            let mut table = write(&self.elevators);
            if table.values().any(|slot| slot.name == elevator.name) {
                return Err(FleetError::DuplicateName(elevator.name));
            }
            table.insert(elevator.id, Slot::new(elevator.clone()));
        }
        self.publish(&FleetEvent::ElevatorCreated(elevator));
        Ok(())
    }

    /// Seeds the table from a snapshot without emitting events.
    ///
    /// Entries with an id already present replace the current state.
    pub fn load(&self, elevators: impl IntoIterator<Item = Elevator>) -> usize {
        let mut table = write(&self.elevators);
        let mut loaded = 0;
        for elevator in elevators {
            table.insert(elevator.id, Slot::new(elevator));
            loaded += 1;
        }
        info!("Loaded {} elevators into state", loaded);
        loaded
    }

    fn entry(&self, id: ElevatorId) -> Result<Entry, FleetError> {
        read(&self.elevators)
            .get(&id)
            .map(|slot| slot.state.clone())
            .ok_or(FleetError::ElevatorNotFound(id))
    }

    /// Returns a snapshot of one elevator.
    pub fn get(&self, id: ElevatorId) -> Result<Elevator, FleetError> {
        let entry = self.entry(id)?;
        let elevator = lock(&entry).clone();
        Ok(elevator)
    }

    /// Snapshot of every elevator, in enumeration order.
    pub fn list(&self) -> Vec<Elevator> {
        self.entries().iter().map(|entry| lock(entry).clone()).collect()
    }

    /// Elevators that are neither in Maintenance nor in Error.
    pub fn list_available(&self) -> Vec<Elevator> {
        self.list().into_iter().filter(Elevator::is_available).collect()
    }

    pub fn ids(&self) -> Vec<ElevatorId> {
        read(&self.elevators).keys().copied().collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        read(&self.elevators).values().any(|slot| slot.name == name)
    }

    pub fn len(&self) -> usize {
        read(&self.elevators).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Vec<Entry> {
        read(&self.elevators).values().map(|slot| slot.state.clone()).collect()
    }

    /// Merges `patch` into the elevator and notifies observers.
    ///
    /// An empty patch changes nothing and emits nothing.
    pub fn update(&self, id: ElevatorId, patch: ElevatorPatch) -> Result<Elevator, FleetError> {
        match self.modify(id, move |_| Some(patch))? {
            Some(elevator) => Ok(elevator),
            None => self.get(id),
        }
    }

    /// Read-compute-merge under the elevator's lock.
    ///
    /// `f` sees the current state and returns the patch to apply; `None` (or
    /// an empty patch) leaves the elevator untouched. Returns the new state
    /// when something was merged.
    pub fn modify<F>(&self, id: ElevatorId, f: F) -> Result<Option<Elevator>, FleetError>
    where
        F: FnOnce(&Elevator) -> Option<ElevatorPatch>,
    {
        let entry = match self.entry(id) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Update for unknown elevator {} ignored", id);
                return Err(err);
            }
        };

        let mut state = lock(&entry);
        let patch = match f(&*state) {
            Some(patch) if !patch.is_empty() => patch,
            _ => return Ok(None),
        };

        let before = state.clone();
        patch.apply_to(&mut *state);
        let after = state.clone();
        self.fan_out(&before, &after);

        Ok(Some(after))
    }

    fn fan_out(&self, before: &Elevator, after: &Elevator) {
        if before.status != after.status {
            debug!("[{}] {} -> {}", after.name, before.status, after.status);

            let transition = StatusTransition { before, after };
            let hook_events: Vec<FleetEvent> = read(&self.hooks)
                .iter()
                .filter_map(|hook| hook.on_transition(&transition))
                .collect();
            for event in &hook_events {
                self.publish(event);
            }
        }
        self.publish(&FleetEvent::ElevatorUpdated(after.clone()));
    }

    /// Delivers `event` to every observer; failures are logged and dropped.
    ///
    /// A panicking observer is contained here so the caller's tick or
    /// dispatch cycle carries on with the remaining elevators.
    pub fn publish(&self, event: &FleetEvent) {
        for observer in read(&self.observers).iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("Fleet observer failed: {}", err),
                Err(_) => error!("Fleet observer panicked while handling {}", event.kind()),
            }
        }
    }
}
