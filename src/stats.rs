//! Scheduler load statistics.
//!
//! Two views: [`SchedulerStats`] is a point-in-time snapshot of live load
//! taken under the scheduler lock, and [`SchedulerCounters`] accumulates
//! lifetime totals in atomics that can be read without the lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::origin::Origin;

/// Point-in-time snapshot of scheduler load.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Requests currently loading, by origin. Idle origins are absent.
    pub loading_by_origin: HashMap<Origin, usize>,
    /// Requests currently queued, by origin. Empty queues are absent.
    pub queued_by_origin: HashMap<Origin, usize>,
    /// Total requests loading across all origins.
    pub total_loading: usize,
    /// Total requests queued across all origins.
    pub total_queued: usize,
    /// Peak concurrent loading observed since start or the last reset.
    pub peak_loading: usize,
}

impl SchedulerStats {
    /// Returns true if nothing is loading or queued.
    pub fn is_idle(&self) -> bool {
        self.total_loading == 0 && self.total_queued == 0
    }
}

/// Cumulative request counters, maintained by the scheduler core.
#[derive(Debug, Default)]
pub struct SchedulerCounters {
    /// Requests accepted by `register`.
    pub registered: AtomicU64,
    /// Registrations rejected as invalid.
    pub rejected: AtomicU64,
    /// Loads completed successfully.
    pub completed: AtomicU64,
    /// Loads that finished in failure.
    pub failed: AtomicU64,
    /// Band promotions applied.
    pub promoted: AtomicU64,
    /// Requests removed via `unregister`.
    pub unregistered: AtomicU64,
}

impl SchedulerCounters {
    /// Get a snapshot of current counter values.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            promoted: self.promoted.load(Ordering::Relaxed),
            unregistered: self.unregistered.load(Ordering::Relaxed),
        }
    }

    /// Clears all counters back to zero.
    pub(crate) fn clear(&self) {
        self.registered.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.promoted.store(0, Ordering::Relaxed);
        self.unregistered.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub registered: u64,
    pub rejected: u64,
    pub completed: u64,
    pub failed: u64,
    pub promoted: u64,
    pub unregistered: u64,
}
