//! Transport collaborator seam.
//!
//! The scheduler decides when a fetch may start; the transport performs it.
//! The scheduler never does network I/O itself.

use std::sync::Arc;

use crate::request::{PriorityBand, RequestId, ResourceHandle};

/// External collaborator that performs the actual resource fetch.
///
/// [`start`](Self::start) must return promptly: enqueue or spawn the real
/// work rather than performing it inline. The transport must eventually
/// report the outcome exactly once via
/// [`LoadScheduler::complete`](crate::scheduler::LoadScheduler::complete);
/// until it does, the request occupies its origin's admission slot.
///
/// The scheduler invokes `start` after releasing its internal lock, so a
/// transport that completes synchronously cannot deadlock it, but
/// asynchronous completion is the expected shape. Retry policy, timeouts,
/// and cancellation of in-flight fetches all belong to the transport (or
/// its caller), not to the scheduler.
pub trait Transport: Send + Sync {
    /// Begins fetching the resource behind `handle`.
    ///
    /// `hint` is the request's priority band at dispatch time; later
    /// promotions are forwarded through the handle's
    /// [`set_priority_hint`](crate::request::ResourceHandle::set_priority_hint).
    fn start(&self, id: RequestId, handle: Arc<dyn ResourceHandle>, hint: PriorityBand);
}
