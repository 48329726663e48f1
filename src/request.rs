//! Resource request model: priority bands, identifiers, and lifecycle states.
//!
//! A request is the unit tracked by the scheduler. The consumer layer owns
//! the actual resource object (an image element or equivalent) and hands the
//! scheduler an opaque [`ResourceHandle`] to it; the scheduler never
//! interprets the handle, it only forwards priority hints through it.

use std::fmt;

/// Scheduling priority band for a resource request.
///
/// Bands govern dequeue order within an origin's wait queue and the hint
/// forwarded to the consumer-owned [`ResourceHandle`]. The derived ordering
/// is promotion order: `Low < Medium < High`, so a band change is an
/// upgrade exactly when the new band compares greater than the current one.
/// The scheduler never downgrades a request's band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityBand {
    /// Background loading, dequeued last.
    Low,
    /// Approaching the viewing region.
    Medium,
    /// Overlapping the viewing region, dequeued first.
    High,
}

impl PriorityBand {
    /// Stable dequeue rank: 0 dequeues first.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            PriorityBand::High => 0,
            PriorityBand::Medium => 1,
            PriorityBand::Low => 2,
        }
    }
}

impl fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityBand::High => write!(f, "high"),
            PriorityBand::Medium => write!(f, "medium"),
            PriorityBand::Low => write!(f, "low"),
        }
    }
}

/// Identifier for a registered request.
///
/// Ids are assigned from a per-scheduler monotonic counter at registration,
/// so the numeric value doubles as the arrival sequence: within a priority
/// band, lower ids dequeue first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Lifecycle state of a tracked request.
///
/// `Registered` is transient: registration routes the request to `Queued`
/// or `Loading` within the same call, so a request is never observed as
/// `Registered` from outside. After registration a request occupies exactly
/// one of `Queued` or `Loading` until it completes, at which point it is
/// dropped from all tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Created, not yet routed. Never observable.
    Registered,
    /// Waiting in its origin's queue for an admission slot.
    Queued,
    /// Handed to the transport; occupies an admission slot.
    Loading,
    /// Finished (successfully or not). No longer tracked.
    Completed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Registered => write!(f, "registered"),
            RequestState::Queued => write!(f, "queued"),
            RequestState::Loading => write!(f, "loading"),
            RequestState::Completed => write!(f, "completed"),
        }
    }
}

/// Capability interface over the consumer-owned resource object.
///
/// The scheduler invokes [`set_priority_hint`](Self::set_priority_hint)
/// when a request is handed to the transport and again whenever an
/// in-flight request is promoted. How the hint maps onto the underlying
/// resource (a fetch-priority attribute, an HTTP priority header, nothing
/// at all) is the implementor's concern.
pub trait ResourceHandle: Send + Sync {
    /// Forwards the request's current priority band to the resource.
    fn set_priority_hint(&self, band: PriorityBand);
}

/// Caller-owned completion callback, invoked exactly once.
pub type LoadCallback = Box<dyn FnOnce() + Send>;
