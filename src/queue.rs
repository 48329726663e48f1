//! Per-origin wait queue for requests awaiting admission.
//!
//! Ordering invariant: all `High` entries precede all `Medium`, which
//! precede all `Low`; within a band, ascending arrival order. Request ids
//! are assigned in arrival order, so the sort key is simply
//! `(band rank, id)`.
//!
//! The queue is a sorted `Vec` with ordered insertion. Per-origin queues
//! stay short in practice (bounded by a page's concurrent resource count,
//! not an unbounded backlog), so insertion sort beats a heap here and keeps
//! iteration order trivially inspectable.

use crate::request::{PriorityBand, RequestId};

/// Entry in an origin's wait queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedEntry {
    /// The waiting request.
    pub id: RequestId,
    /// Band at enqueue or last promotion.
    pub band: PriorityBand,
}

impl QueuedEntry {
    fn sort_key(&self) -> (u8, RequestId) {
        (self.band.rank(), self.id)
    }
}

/// Band-ordered wait queue for a single origin.
#[derive(Debug, Default)]
pub struct OriginQueue {
    entries: Vec<QueuedEntry>,
}

impl OriginQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a request, preserving the ordering invariant.
    pub fn enqueue(&mut self, id: RequestId, band: PriorityBand) {
        let entry = QueuedEntry { id, band };
        let position = self
            .entries
            .partition_point(|existing| existing.sort_key() <= entry.sort_key());
        self.entries.insert(position, entry);
    }

    /// Removes and returns the highest-band, earliest-arrived entry.
    pub fn dequeue_next(&mut self) -> Option<QueuedEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// Moves a queued request to a higher band.
    ///
    /// The entry is removed and re-inserted under `new_band` with its
    /// arrival order intact, so it lands ahead of lower-band entries and of
    /// same-band entries that arrived after it. Returns `false` without
    /// reordering if the request is not queued here or `new_band` is not an
    /// upgrade.
    pub fn promote(&mut self, id: RequestId, new_band: PriorityBand) -> bool {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        if self.entries[position].band >= new_band {
            return false;
        }
        self.entries.remove(position);
        self.enqueue(id, new_band);
        true
    }

    /// Removes a request from the queue. Returns whether it was present.
    pub fn remove(&mut self, id: RequestId) -> bool {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        self.entries.remove(position);
        true
    }

    /// Number of waiting requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The queue contents in dequeue order.
    pub fn entries(&self) -> &[QueuedEntry] {
        &self.entries
    }
}
