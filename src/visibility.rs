//! Viewport-visibility reclassification.
//!
//! External visibility notifiers (an intersection observer equivalent, a
//! scroll tracker) push [`VisibilityEvent`]s into an mpsc channel; the
//! [`ViewportReclassifier`] drains the channel on its own task and
//! translates each event into a priority promotion on the scheduler.
//! Classification is evaluated incrementally per event, never as a scan
//! over all tracked requests, and it only ever raises bands: the
//! scheduler's promotion monotonicity guarantees a request already at
//! `High` is untouched by a later `Medium` signal.
//!
//! ```text
//! Visibility Notifier ──► mpsc::Sender<VisibilityEvent>
//!                                   │
//!                                   ▼
//!                        ViewportReclassifier::run
//!                                   │ classify(distance, threshold)
//!                                   ▼
//!                        LoadScheduler::promote_priority
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::request::{PriorityBand, RequestId};
use crate::scheduler::LoadScheduler;

/// A visibility signal for a single tracked request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisibilityEvent {
    /// The element overlaps the viewing region.
    Intersecting {
        /// The request whose element this signal describes.
        request: RequestId,
    },
    /// Signed distance between the element and the viewing region, in the
    /// notifier's distance units. Non-positive values mean overlap,
    /// including elements positioned above the viewport.
    Distance {
        /// The request whose element this signal describes.
        request: RequestId,
        /// Signed distance from the viewing region.
        distance: f64,
    },
}

/// Classifies a viewport distance into a target band.
///
/// - `distance <= 0.0`: the element overlaps the viewing region, `High`.
///   Zero itself counts as overlap; this boundary is deliberate, not
///   inherited.
/// - `0 < distance <= medium_threshold`: approaching, `Medium`.
/// - Beyond the threshold: `None`, the registered band stands.
pub fn classify(distance: f64, medium_threshold: f64) -> Option<PriorityBand> {
    if distance <= 0.0 {
        Some(PriorityBand::High)
    } else if distance <= medium_threshold {
        Some(PriorityBand::Medium)
    } else {
        None
    }
}

/// Reclassifier activity counters.
#[derive(Debug, Default)]
pub struct ReclassifierStats {
    /// Visibility events consumed.
    pub events_processed: AtomicU64,
    /// Events that resulted in a band promotion.
    pub promotions_applied: AtomicU64,
}

impl ReclassifierStats {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> ReclassifierStatsSnapshot {
        ReclassifierStatsSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            promotions_applied: self.promotions_applied.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of reclassifier statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclassifierStatsSnapshot {
    pub events_processed: u64,
    pub promotions_applied: u64,
}

/// Consumes visibility events and promotes the named requests.
pub struct ViewportReclassifier {
    scheduler: Arc<LoadScheduler>,
    stats: Arc<ReclassifierStats>,
}

impl ViewportReclassifier {
    /// Creates a reclassifier bound to a scheduler.
    pub fn new(scheduler: Arc<LoadScheduler>) -> Self {
        Self {
            scheduler,
            stats: Arc::new(ReclassifierStats::default()),
        }
    }

    /// Get access to the statistics for monitoring.
    pub fn stats(&self) -> Arc<ReclassifierStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the reclassifier, draining events from the channel.
    ///
    /// Returns when the channel closes or the cancellation token fires.
    /// Spawn this as a background task next to the scheduler.
    pub async fn run(
        self,
        mut event_rx: mpsc::Receiver<VisibilityEvent>,
        cancellation_token: CancellationToken,
    ) {
        info!("Viewport reclassifier started");

        loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    info!("Viewport reclassifier shutting down");
                    break;
                }

                event = event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            debug!("Visibility channel closed, stopping reclassifier");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Applies a single visibility event.
    ///
    /// Exposed separately so notifiers running on the scheduler's own
    /// execution context can bypass the channel.
    pub fn handle_event(&self, event: VisibilityEvent) {
        self.stats.events_processed.fetch_add(1, Ordering::Relaxed);

        let (id, target) = match event {
            VisibilityEvent::Intersecting { request } => (request, Some(PriorityBand::High)),
            VisibilityEvent::Distance { request, distance } => {
                let threshold = self.scheduler.medium_priority_threshold();
                (request, classify(distance, threshold))
            }
        };

        let Some(band) = target else {
            trace!(request = %id, "Visibility event beyond promotion threshold");
            return;
        };

        if self.scheduler.promote_priority(id, band) {
            self.stats.promotions_applied.fetch_add(1, Ordering::Relaxed);
            trace!(request = %id, band = %band, "Promoted from visibility event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::request::ResourceHandle;
    use crate::transport::Transport;

    struct NullTransport;

    impl Transport for NullTransport {
        fn start(&self, _id: RequestId, _handle: Arc<dyn ResourceHandle>, _hint: PriorityBand) {}
    }

    struct NullHandle;

    impl ResourceHandle for NullHandle {
        fn set_priority_hint(&self, _band: PriorityBand) {}
    }

    fn scheduler() -> Arc<LoadScheduler> {
        Arc::new(LoadScheduler::new(
            SchedulerConfig::new(1, 500.0),
            Arc::new(NullTransport),
        ))
    }

    fn register(scheduler: &LoadScheduler, band: PriorityBand) -> RequestId {
        scheduler
            .register(
                "https://cdn.example.com/photo.jpg",
                band,
                Arc::new(NullHandle),
                None,
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_classify_zero_distance_is_high() {
        assert_eq!(classify(0.0, 500.0), Some(PriorityBand::High));
    }

    #[test]
    fn test_classify_negative_distance_is_high() {
        // Elements above the viewport report negative distances.
        assert_eq!(classify(-120.0, 500.0), Some(PriorityBand::High));
    }

    #[test]
    fn test_classify_within_threshold_is_medium() {
        assert_eq!(classify(300.0, 500.0), Some(PriorityBand::Medium));
        assert_eq!(classify(500.0, 500.0), Some(PriorityBand::Medium));
    }

    #[test]
    fn test_classify_beyond_threshold_is_unchanged() {
        assert_eq!(classify(600.0, 500.0), None);
        assert_eq!(classify(500.1, 500.0), None);
    }

    #[test]
    fn test_intersecting_event_promotes_to_high() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));
        let _loading = register(&scheduler, PriorityBand::Low);
        let queued = register(&scheduler, PriorityBand::Low);

        reclassifier.handle_event(VisibilityEvent::Intersecting { request: queued });

        assert_eq!(scheduler.request_band(queued), Some(PriorityBand::High));
        assert_eq!(reclassifier.stats().snapshot().promotions_applied, 1);
    }

    #[test]
    fn test_distance_event_promotes_to_medium() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));
        let _loading = register(&scheduler, PriorityBand::Low);
        let queued = register(&scheduler, PriorityBand::Low);

        reclassifier.handle_event(VisibilityEvent::Distance {
            request: queued,
            distance: 300.0,
        });

        assert_eq!(scheduler.request_band(queued), Some(PriorityBand::Medium));
    }

    #[test]
    fn test_far_event_leaves_band_unchanged() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));
        let _loading = register(&scheduler, PriorityBand::Low);
        let queued = register(&scheduler, PriorityBand::Low);

        reclassifier.handle_event(VisibilityEvent::Distance {
            request: queued,
            distance: 900.0,
        });

        assert_eq!(scheduler.request_band(queued), Some(PriorityBand::Low));
        let stats = reclassifier.stats().snapshot();
        assert_eq!(stats.events_processed, 1);
        assert_eq!(stats.promotions_applied, 0);
    }

    #[test]
    fn test_medium_signal_never_downgrades_high() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));
        let _loading = register(&scheduler, PriorityBand::Low);
        let queued = register(&scheduler, PriorityBand::High);

        reclassifier.handle_event(VisibilityEvent::Distance {
            request: queued,
            distance: 300.0,
        });

        assert_eq!(scheduler.request_band(queued), Some(PriorityBand::High));
        assert_eq!(reclassifier.stats().snapshot().promotions_applied, 0);
    }

    #[test]
    fn test_event_for_unknown_request_is_ignored() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));

        reclassifier.handle_event(VisibilityEvent::Intersecting {
            request: crate::request::RequestId::new(999),
        });

        assert_eq!(reclassifier.stats().snapshot().promotions_applied, 0);
    }

    #[tokio::test]
    async fn test_run_drains_events_until_cancelled() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(Arc::clone(&scheduler));
        let stats = reclassifier.stats();

        let _loading = register(&scheduler, PriorityBand::Low);
        let queued = register(&scheduler, PriorityBand::Low);

        let (event_tx, event_rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        let task = tokio::spawn(reclassifier.run(event_rx, token.clone()));

        event_tx
            .send(VisibilityEvent::Intersecting { request: queued })
            .await
            .unwrap();

        // Wait for the event to be applied.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(1);
        while scheduler.request_band(queued) != Some(PriorityBand::High) {
            assert!(std::time::Instant::now() < deadline, "promotion never applied");
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        token.cancel();
        task.await.unwrap();
        assert_eq!(stats.snapshot().events_processed, 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let scheduler = scheduler();
        let reclassifier = ViewportReclassifier::new(scheduler);

        let (event_tx, event_rx) = mpsc::channel::<VisibilityEvent>(4);
        let token = CancellationToken::new();
        let task = tokio::spawn(reclassifier.run(event_rx, token));

        drop(event_tx);
        task.await.unwrap();
    }
}
