//! The "DISPATCH" Engine - request queue and elevator selection.
//!
//! Requests wait in a FIFO queue; one dispatch cycle assigns at most one of
//! them. Selection is a two-rule heuristic:
//! 1. **Nearest idle**: among idle elevators, the one closest to the origin floor
//! 2. **Fewest targets**: if none is idle, the available elevator with the
//!    shortest target list
//!
//! Ties go to the elevator enumerated first. Direction and cabin load are
//! deliberately not considered.

use crate::lift_model::{merge_targets, Elevator, ElevatorPatch, ElevatorStatus, TripRequest};
use crate::lift_store::{lock, ElevatorStore};
use liftsim_env::ElevatorId;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

// ============================================================================
// QUEUE
// ============================================================================

/// Ordered buffer of pending trip requests.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: Mutex<VecDeque<TripRequest>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Appends a request; same-floor requests are dropped.
    ///
    /// Returns true if the request was queued.
    pub fn enqueue(&self, request: TripRequest) -> bool {
        if !request.is_trip() {
            debug!("[QUEUE] Dropping same-floor request {}", request);
            return false;
        }
        let mut pending = lock(&self.pending);
        pending.push_back(request);
        info!("[QUEUE] Request added: {}. Queue size: {}", request, pending.len());
        true
    }

    /// Puts a request back at the head so it is retried first.
    pub fn requeue(&self, request: TripRequest) {
        lock(&self.pending).push_front(request);
    }

    pub fn pop(&self) -> Option<TripRequest> {
        lock(&self.pending).pop_front()
    }

    pub fn peek(&self) -> Option<TripRequest> {
        lock(&self.pending).front().copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending requests, head first.
    pub fn snapshot(&self) -> Vec<TripRequest> {
        lock(&self.pending).iter().copied().collect()
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Which rule picked the elevator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    NearestIdle,
    FewestTargets,
}

/// Picks the elevator for `request` among `available`.
pub fn select_elevator(available: &[Elevator], request: &TripRequest) -> Option<(ElevatorId, SelectionRule)> {
    let nearest_idle = available
        .iter()
        .filter(|e| e.status == ElevatorStatus::Idle)
        .min_by_key(|e| (e.current_floor - request.from_floor).unsigned_abs());
    if let Some(elevator) = nearest_idle {
        return Some((elevator.id, SelectionRule::NearestIdle));
    }

    available
        .iter()
        .min_by_key(|e| e.target_floors.len())
        .map(|elevator| (elevator.id, SelectionRule::FewestTargets))
}

// ============================================================================
// DISPATCH CYCLE
// ============================================================================

/// Why a request went back to the head of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequeueReason {
    /// Every elevator is in Maintenance or Error
    NoneAvailable,

    /// The assignment itself failed
    Failed(String),
}

impl std::fmt::Display for RequeueReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequeueReason::NoneAvailable => write!(f, "no available elevators"),
            RequeueReason::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// What one dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Queue was empty
    Empty,

    /// Another cycle was still running
    Skipped,

    Assigned {
        request: TripRequest,
        elevator_id: ElevatorId,
        rule: SelectionRule,
    },

    Requeued {
        request: TripRequest,
        reason: RequeueReason,
    },
}

/// Runs dispatch cycles, never more than one at a time.
#[derive(Debug)]
pub struct Dispatcher {
    queue: Arc<RequestQueue>,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag when the cycle ends, however it ends.
pub struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(queue: Arc<RequestQueue>) -> Self {
        Self {
            queue,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    /// Claims the cycle; `None` if one is already running.
    pub fn try_begin(&self) -> Option<CycleGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CycleGuard { flag: &self.in_progress })
    }

    /// Assigns the head request, if any, to one elevator.
    pub fn run_cycle(&self, store: &ElevatorStore) -> DispatchOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("[DISPATCH] Previous cycle still running, skipping");
            return DispatchOutcome::Skipped;
        };

        let Some(request) = self.queue.pop() else {
            return DispatchOutcome::Empty;
        };

        let available = store.list_available();
        let Some((elevator_id, rule)) = select_elevator(&available, &request) else {
            return self.requeue(request, RequeueReason::NoneAvailable);
        };

        self.assign(store, request, elevator_id, rule)
    }

    /// Merges the request into the chosen elevator, re-queueing it if the
    /// elevator is gone or left service since it was selected.
    fn assign(
        &self,
        store: &ElevatorStore,
        request: TripRequest,
        elevator_id: ElevatorId,
        rule: SelectionRule,
    ) -> DispatchOutcome {
        let assigned = store.modify(elevator_id, |elevator| {
            if !elevator.is_available() {
                return None;
            }
            Some(ElevatorPatch::new().targets(merge_targets(&elevator.target_floors, &request.floors())))
        });

        match assigned {
            Ok(Some(elevator)) => {
                match rule {
                    SelectionRule::NearestIdle => info!(
                        "[ALGORITHM] Idle elevator {} is closest for request {}",
                        elevator.name, request
                    ),
                    SelectionRule::FewestTargets => info!(
                        "[ALGORITHM] All elevators are busy. Assigning {} to {} ({} targets)",
                        request,
                        elevator.name,
                        elevator.target_floors.len()
                    ),
                }
                DispatchOutcome::Assigned { request, elevator_id, rule }
            }
            Ok(None) => self.requeue(request, RequeueReason::Failed("elevator no longer available".into())),
            Err(err) => self.requeue(request, RequeueReason::Failed(err.to_string())),
        }
    }

    fn requeue(&self, request: TripRequest, reason: RequeueReason) -> DispatchOutcome {
        self.queue.requeue(request);
        warn!("[QUEUE] Re-queueing request {}. Reason: {}", request, reason);
        DispatchOutcome::Requeued { request, reason }
    }
}
