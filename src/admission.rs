//! Per-origin admission accounting.
//!
//! Tracks how many requests are loading for each origin against a
//! configured ceiling. This is a plain counter table rather than a
//! semaphore pool: admission is decided under the scheduler's internal
//! lock, so nothing ever waits here. Callers check [`has_capacity`] and
//! either dispatch immediately or enqueue.
//!
//! [`has_capacity`]: OriginAdmission::has_capacity

use std::collections::HashMap;

use tracing::warn;

use crate::origin::Origin;

/// In-flight load counts per origin against a configurable ceiling.
///
/// Double-release is prevented upstream by request state checks (a
/// completed request cannot release twice); as a second line of defense,
/// [`release`](Self::release) saturates at zero and logs instead of
/// underflowing.
#[derive(Debug)]
pub struct OriginAdmission {
    /// Loading counts, keyed by origin. Entries are removed at zero.
    loading: HashMap<Origin, usize>,
    /// Per-origin concurrency ceiling.
    max_per_origin: usize,
    /// Total loading across all origins.
    total: usize,
    /// Peak total observed since creation or the last clear.
    peak: usize,
}

impl OriginAdmission {
    /// Creates a tracker with the given per-origin ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `max_per_origin` is 0.
    pub fn new(max_per_origin: usize) -> Self {
        assert!(max_per_origin > 0, "max_per_origin must be > 0");
        Self {
            loading: HashMap::new(),
            max_per_origin,
            total: 0,
            peak: 0,
        }
    }

    /// Returns true if the origin is below its concurrency ceiling.
    pub fn has_capacity(&self, origin: &Origin) -> bool {
        self.loading_count(origin) < self.max_per_origin
    }

    /// Records one more in-flight load for the origin.
    ///
    /// Callers must check [`has_capacity`](Self::has_capacity) first, under
    /// the same lock that serializes scheduler state.
    pub fn acquire(&mut self, origin: &Origin) {
        *self.loading.entry(origin.clone()).or_insert(0) += 1;
        self.total += 1;
        if self.total > self.peak {
            self.peak = self.total;
        }
    }

    /// Records the completion of an in-flight load for the origin.
    pub fn release(&mut self, origin: &Origin) {
        match self.loading.get_mut(origin) {
            Some(count) if *count > 1 => {
                *count -= 1;
                self.total -= 1;
            }
            Some(_) => {
                self.loading.remove(origin);
                self.total -= 1;
            }
            None => {
                warn!(origin = %origin, "Release for origin with no in-flight loads, ignoring");
            }
        }
    }

    /// Returns the number of in-flight loads for the origin.
    pub fn loading_count(&self, origin: &Origin) -> usize {
        self.loading.get(origin).copied().unwrap_or(0)
    }

    /// Returns the total in-flight loads across all origins.
    pub fn total_loading(&self) -> usize {
        self.total
    }

    /// Returns the peak total in-flight loads observed.
    pub fn peak_loading(&self) -> usize {
        self.peak
    }

    /// Returns the configured per-origin ceiling.
    pub fn max_per_origin(&self) -> usize {
        self.max_per_origin
    }

    /// Changes the per-origin ceiling for subsequent admission decisions.
    ///
    /// Origins already above a lowered ceiling simply admit nothing new
    /// until completions bring them back under it.
    pub fn set_max_per_origin(&mut self, max_per_origin: usize) {
        assert!(max_per_origin > 0, "max_per_origin must be > 0");
        self.max_per_origin = max_per_origin;
    }

    /// Iterates over origins with at least one in-flight load.
    pub fn per_origin(&self) -> impl Iterator<Item = (&Origin, usize)> {
        self.loading.iter().map(|(origin, count)| (origin, *count))
    }

    /// Discards all counters, including the peak.
    pub fn clear(&mut self) {
        self.loading.clear();
        self.total = 0;
        self.peak = 0;
    }
}
