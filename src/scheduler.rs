//! Scheduler core: registration, admission, dispatch, and completion.
//!
//! # Architecture
//!
//! ```text
//! register(url, band, handle, …)
//!        │
//!        ▼
//!  Origin derivation ──► capacity at origin? ──yes──► Loading ──► Transport::start
//!                              │no                                     │
//!                              ▼                                       ▼
//!                    OriginQueue (band, arrival)              complete(id, success)
//!                              ▲                                       │
//!                              │         dispatch_next(origin) ◄───────┘
//! ```
//!
//! All state mutations serialize behind one internal mutex so that admission
//! decisions and dispatch observe a consistent view of capacity and queue
//! contents: the per-origin ceiling is never exceeded and a queued request is
//! never dispatched twice. Lock-held time is bounded bookkeeping only; caller
//! callbacks and transport hand-offs run after the lock is released.
//!
//! The scheduler is an explicit, constructible object with injected
//! configuration and transport. Applications wire exactly one instance at
//! startup; nothing here is process-global.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, trace, warn};

use crate::admission::OriginAdmission;
use crate::config::{ConfigUpdate, SchedulerConfig};
use crate::error::SchedulerError;
use crate::origin::Origin;
use crate::queue::OriginQueue;
use crate::request::{LoadCallback, PriorityBand, RequestId, RequestState, ResourceHandle};
use crate::stats::{CountersSnapshot, SchedulerCounters, SchedulerStats};
use crate::transport::Transport;

/// A tracked request and its caller-owned attachments.
struct TrackedRequest {
    origin: Origin,
    band: PriorityBand,
    state: RequestState,
    handle: Arc<dyn ResourceHandle>,
    on_load: Option<LoadCallback>,
    on_error: Option<LoadCallback>,
    /// Set by `unregister` on a loading request: the eventual completion
    /// still frees the admission slot but invokes no callbacks.
    detached: bool,
}

/// Mutable scheduler state, guarded by the core's single mutex.
struct SchedulerState {
    config: SchedulerConfig,
    requests: HashMap<RequestId, TrackedRequest>,
    queues: HashMap<Origin, OriginQueue>,
    admission: OriginAdmission,
    next_id: u64,
}

/// A dispatch decision, carried out after the state lock is released.
struct Dispatch {
    id: RequestId,
    handle: Arc<dyn ResourceHandle>,
    band: PriorityBand,
}

/// Priority-based resource-loading scheduler with per-origin admission
/// control.
///
/// Callers register fetches; the scheduler either starts them through the
/// injected [`Transport`] immediately or parks them in a band-ordered queue
/// until a slot at their origin frees up. Completions drive dispatch of
/// queued work; visibility-driven promotions (see
/// [`ViewportReclassifier`](crate::visibility::ViewportReclassifier))
/// reorder the queues or update the hint on in-flight requests.
///
/// All operations are non-blocking and safe to call from any thread.
pub struct LoadScheduler {
    transport: Arc<dyn Transport>,
    state: Mutex<SchedulerState>,
    counters: SchedulerCounters,
}

impl LoadScheduler {
    /// Creates a scheduler with the given configuration and transport.
    pub fn new(config: SchedulerConfig, transport: Arc<dyn Transport>) -> Self {
        let admission = OriginAdmission::new(config.max_concurrent_per_origin);
        info!(
            max_per_origin = config.max_concurrent_per_origin,
            medium_threshold = config.medium_priority_threshold,
            "Created load scheduler"
        );
        Self {
            transport,
            state: Mutex::new(SchedulerState {
                config,
                requests: HashMap::new(),
                queues: HashMap::new(),
                admission,
                next_id: 0,
            }),
            counters: SchedulerCounters::default(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler state lock poisoned")
    }

    /// Registers a resource for loading.
    ///
    /// If the URL's origin has spare capacity the request transitions
    /// straight to `Loading` and is handed to the transport; otherwise it
    /// is queued behind its band. `on_load` and `on_error` are invoked
    /// exactly once at completion, whichever applies.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidRequest`] for an empty or malformed
    /// URL; no state is mutated in that case.
    pub fn register(
        &self,
        url: &str,
        band: PriorityBand,
        handle: Arc<dyn ResourceHandle>,
        on_load: Option<LoadCallback>,
        on_error: Option<LoadCallback>,
    ) -> Result<RequestId, SchedulerError> {
        let origin = match Origin::parse(url) {
            Ok(origin) => origin,
            Err(err) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(url, error = %err, "Rejected registration");
                return Err(err);
            }
        };

        let mut dispatch = None;
        let id;
        {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            id = RequestId::new(state.next_id);
            state.next_id += 1;

            let mut request = TrackedRequest {
                origin: origin.clone(),
                band,
                state: RequestState::Registered,
                handle,
                on_load,
                on_error,
                detached: false,
            };

            if state.admission.has_capacity(&origin) {
                state.admission.acquire(&origin);
                request.state = RequestState::Loading;
                dispatch = Some(Dispatch {
                    id,
                    handle: Arc::clone(&request.handle),
                    band,
                });
                debug!(request = %id, origin = %origin, band = %band, "Dispatching immediately");
            } else {
                request.state = RequestState::Queued;
                let queue = state.queues.entry(origin.clone()).or_default();
                queue.enqueue(id, band);
                debug!(
                    request = %id,
                    origin = %origin,
                    band = %band,
                    queued = queue.len(),
                    "Origin at capacity, queued"
                );
            }

            state.requests.insert(id, request);
        }

        self.counters.registered.fetch_add(1, Ordering::Relaxed);
        if let Some(dispatch) = dispatch {
            self.start_transport(dispatch);
        }
        Ok(id)
    }

    /// Raises a request's priority band.
    ///
    /// No-op (returning `false`) if `new_band` is not strictly higher than
    /// the current band, or if the request is unknown or already completed;
    /// bands never move down. A queued request is reordered within its
    /// origin's queue; a loading request has the new hint forwarded to its
    /// handle. Promotion never dispatches anything, dispatch is driven
    /// solely by completions.
    pub fn promote_priority(&self, id: RequestId, new_band: PriorityBand) -> bool {
        let hint = {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            let Some(request) = state.requests.get_mut(&id) else {
                trace!(request = %id, "Promotion for unknown request, ignoring");
                return false;
            };
            if new_band <= request.band {
                trace!(
                    request = %id,
                    current = %request.band,
                    requested = %new_band,
                    "Promotion is not an upgrade, ignoring"
                );
                return false;
            }

            let previous = request.band;
            request.band = new_band;
            let origin = request.origin.clone();
            let request_state = request.state;
            let handle = Arc::clone(&request.handle);

            match request_state {
                RequestState::Queued => {
                    if let Some(queue) = state.queues.get_mut(&origin) {
                        queue.promote(id, new_band);
                    }
                    debug!(
                        request = %id,
                        from = %previous,
                        to = %new_band,
                        "Reordered queued request"
                    );
                    None
                }
                RequestState::Loading => {
                    debug!(
                        request = %id,
                        from = %previous,
                        to = %new_band,
                        "Updating hint for in-flight request"
                    );
                    Some(handle)
                }
                // Registered is transient and completed requests leave the
                // map, so neither is reachable here.
                RequestState::Registered | RequestState::Completed => None,
            }
        };

        self.counters.promoted.fetch_add(1, Ordering::Relaxed);
        if let Some(handle) = hint {
            handle.set_priority_hint(new_band);
        }
        true
    }

    /// Reports the outcome of an in-flight load.
    ///
    /// Valid only for a request in `Loading`; anything else (double
    /// completion from a misbehaving transport, an id discarded by
    /// `reset`) is logged and ignored so a stray callback can never corrupt
    /// admission accounting. Frees the origin's slot, drops the request
    /// from tracking, invokes the caller's callback, then dispatches queued
    /// work for that origin while capacity remains. Failures and successes
    /// are identical for slot accounting.
    pub fn complete(&self, id: RequestId, success: bool) {
        let (callback, dispatches) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            match state.requests.get(&id) {
                None => {
                    warn!(request = %id, "Completion for unknown request, ignoring");
                    return;
                }
                Some(request) if request.state != RequestState::Loading => {
                    warn!(
                        request = %id,
                        state = %request.state,
                        "Completion for request that is not loading, ignoring"
                    );
                    return;
                }
                Some(_) => {}
            }

            // Completed requests are dropped from all tracking.
            let mut request = state
                .requests
                .remove(&id)
                .expect("request presence checked above");
            let origin = request.origin.clone();
            state.admission.release(&origin);

            let callback = if request.detached {
                None
            } else if success {
                request.on_load.take()
            } else {
                request.on_error.take()
            };

            debug!(
                request = %id,
                origin = %origin,
                success,
                detached = request.detached,
                "Load completed"
            );

            let dispatches = Self::dispatch_next(state, &origin);
            (callback, dispatches)
        };

        if success {
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(callback) = callback {
            callback();
        }
        for dispatch in dispatches {
            self.start_transport(dispatch);
        }
    }

    /// Cancels the scheduler's interest in a request.
    ///
    /// A queued request is removed and never dispatches. A loading request
    /// is detached: its callbacks are dropped, but the bookkeeping stays so
    /// the eventual completion frees the admission slot exactly once.
    /// Cancelling the in-flight transport operation itself is the
    /// transport's responsibility. Unknown ids are ignored.
    pub fn unregister(&self, id: RequestId) {
        let removed = {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            let Some(request) = state.requests.get_mut(&id) else {
                trace!(request = %id, "Unregister for unknown request, ignoring");
                return;
            };

            match request.state {
                RequestState::Queued => {
                    let origin = request.origin.clone();
                    state.requests.remove(&id);
                    if let Some(queue) = state.queues.get_mut(&origin) {
                        queue.remove(id);
                    }
                    if state.queues.get(&origin).is_some_and(OriginQueue::is_empty) {
                        state.queues.remove(&origin);
                    }
                    debug!(request = %id, origin = %origin, "Unregistered queued request");
                    true
                }
                RequestState::Loading => {
                    request.detached = true;
                    request.on_load = None;
                    request.on_error = None;
                    debug!(request = %id, "Detached in-flight request");
                    true
                }
                RequestState::Registered | RequestState::Completed => false,
            }
        };

        if removed {
            self.counters.unregistered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns a snapshot of current load per origin and in total.
    pub fn stats(&self) -> SchedulerStats {
        let guard = self.lock_state();

        let loading_by_origin: HashMap<Origin, usize> = guard
            .admission
            .per_origin()
            .map(|(origin, count)| (origin.clone(), count))
            .collect();
        let queued_by_origin: HashMap<Origin, usize> = guard
            .queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(origin, queue)| (origin.clone(), queue.len()))
            .collect();
        let total_queued = queued_by_origin.values().sum();

        SchedulerStats {
            loading_by_origin,
            queued_by_origin,
            total_loading: guard.admission.total_loading(),
            total_queued,
            peak_loading: guard.admission.peak_loading(),
        }
    }

    /// Returns a snapshot of the cumulative counters.
    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    /// Applies a partial configuration update.
    ///
    /// Affects subsequent admission decisions and classifications only;
    /// in-flight requests are not re-evaluated and nothing is dispatched
    /// until the next completion.
    pub fn update_config(&self, update: ConfigUpdate) {
        let mut guard = self.lock_state();
        let state = &mut *guard;

        state.config.apply(update);
        state
            .admission
            .set_max_per_origin(state.config.max_concurrent_per_origin);
        info!(
            max_per_origin = state.config.max_concurrent_per_origin,
            medium_threshold = state.config.medium_priority_threshold,
            "Updated scheduler configuration"
        );
    }

    /// Discards all tracked state: queues, admission counters, requests,
    /// and cumulative counters.
    ///
    /// Completion callbacks for in-flight requests are dropped without
    /// being invoked, and later completions for discarded ids are ignored.
    /// Primarily for test isolation.
    pub fn reset(&self) {
        {
            let mut guard = self.lock_state();
            let state = &mut *guard;

            let dropped = state.requests.len();
            state.requests.clear();
            state.queues.clear();
            state.admission.clear();
            if dropped > 0 {
                debug!(dropped, "Reset discarded tracked requests");
            }
        }
        self.counters.clear();
        info!("Scheduler reset");
    }

    /// Current distance threshold for medium-band promotion.
    pub fn medium_priority_threshold(&self) -> f64 {
        self.lock_state().config.medium_priority_threshold
    }

    /// Current per-origin concurrency ceiling.
    pub fn max_concurrent_per_origin(&self) -> usize {
        self.lock_state().config.max_concurrent_per_origin
    }

    /// Lifecycle state of a request, if it is still tracked.
    pub fn request_state(&self, id: RequestId) -> Option<RequestState> {
        self.lock_state().requests.get(&id).map(|r| r.state)
    }

    /// Current priority band of a request, if it is still tracked.
    pub fn request_band(&self, id: RequestId) -> Option<PriorityBand> {
        self.lock_state().requests.get(&id).map(|r| r.band)
    }

    /// Drains the origin's queue into `Loading` while capacity remains.
    fn dispatch_next(state: &mut SchedulerState, origin: &Origin) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        loop {
            if !state.admission.has_capacity(origin) {
                break;
            }
            let Some(entry) = state
                .queues
                .get_mut(origin)
                .and_then(OriginQueue::dequeue_next)
            else {
                break;
            };
            let Some(request) = state.requests.get_mut(&entry.id) else {
                // Unregister removes queue entries together with the
                // request, so a dangling entry indicates a bookkeeping bug.
                warn!(request = %entry.id, "Dequeued entry without a tracked request, skipping");
                continue;
            };
            state.admission.acquire(origin);
            request.state = RequestState::Loading;
            debug!(
                request = %entry.id,
                origin = %origin,
                band = %request.band,
                "Dispatching queued request"
            );
            dispatches.push(Dispatch {
                id: entry.id,
                handle: Arc::clone(&request.handle),
                band: request.band,
            });
        }

        if state.queues.get(origin).is_some_and(OriginQueue::is_empty) {
            state.queues.remove(origin);
        }
        dispatches
    }

    /// Hands a request to the transport, outside the state lock.
    fn start_transport(&self, dispatch: Dispatch) {
        dispatch.handle.set_priority_hint(dispatch.band);
        self.transport
            .start(dispatch.id, Arc::clone(&dispatch.handle), dispatch.band);
    }
}

impl std::fmt::Debug for LoadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock_state();
        f.debug_struct("LoadScheduler")
            .field("tracked_requests", &guard.requests.len())
            .field("total_loading", &guard.admission.total_loading())
            .field(
                "max_concurrent_per_origin",
                &guard.config.max_concurrent_per_origin,
            )
            .finish()
    }
}
