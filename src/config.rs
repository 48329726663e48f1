//! Scheduler configuration.

use tracing::warn;

/// Default maximum concurrent loads per origin.
///
/// Matches the multiplexed-connection budget user agents typically grant a
/// single origin.
pub const DEFAULT_MAX_CONCURRENT_PER_ORIGIN: usize = 6;

/// Default distance threshold, in the visibility notifier's distance units,
/// at or below which a pending request is promoted to `Medium`.
pub const DEFAULT_MEDIUM_PRIORITY_THRESHOLD: f64 = 500.0;

/// Load scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of requests loading concurrently per origin.
    pub max_concurrent_per_origin: usize,
    /// Viewport distance at or below which requests are promoted to
    /// `Medium` by the reclassifier.
    pub medium_priority_threshold: f64,
}

impl SchedulerConfig {
    /// Creates a configuration with explicit values.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent_per_origin` is 0.
    pub fn new(max_concurrent_per_origin: usize, medium_priority_threshold: f64) -> Self {
        assert!(
            max_concurrent_per_origin > 0,
            "max_concurrent_per_origin must be > 0"
        );
        Self {
            max_concurrent_per_origin,
            medium_priority_threshold,
        }
    }

    /// Applies a partial update.
    ///
    /// A zero concurrency limit would wedge every origin, so such an update
    /// is rejected with a warning rather than applied.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(limit) = update.max_concurrent_per_origin {
            if limit == 0 {
                warn!("Ignoring config update: max_concurrent_per_origin must be > 0");
            } else {
                self.max_concurrent_per_origin = limit;
            }
        }
        if let Some(threshold) = update.medium_priority_threshold {
            self.medium_priority_threshold = threshold;
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_per_origin: DEFAULT_MAX_CONCURRENT_PER_ORIGIN,
            medium_priority_threshold: DEFAULT_MEDIUM_PRIORITY_THRESHOLD,
        }
    }
}

/// Partial configuration update applied at runtime.
///
/// Unset fields leave the current value untouched. Updates affect
/// subsequent admission decisions only; in-flight requests are not
/// re-evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigUpdate {
    /// New per-origin concurrency ceiling, if changing.
    pub max_concurrent_per_origin: Option<usize>,
    /// New medium-promotion distance threshold, if changing.
    pub medium_priority_threshold: Option<f64>,
}

impl ConfigUpdate {
    /// Sets the per-origin concurrency ceiling.
    pub fn max_concurrent_per_origin(mut self, limit: usize) -> Self {
        self.max_concurrent_per_origin = Some(limit);
        self
    }

    /// Sets the medium-promotion distance threshold.
    pub fn medium_priority_threshold(mut self, threshold: f64) -> Self {
        self.medium_priority_threshold = Some(threshold);
        self
    }
}
