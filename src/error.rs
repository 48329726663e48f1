//! Error types for the scheduler.
//!
//! Only registration-time validation surfaces as a `Result`: the error is
//! returned synchronously and no state is mutated. Transport failures are
//! expected operational outcomes and reach the caller solely through its
//! error callback at completion time; a completion reported against a
//! request that is not loading is logged and ignored rather than surfaced.
//! There is no global error state.

use thiserror::Error;

/// Errors returned synchronously by scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The registration URL was empty or malformed.
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidRequest {
        /// The URL as supplied by the caller.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl SchedulerError {
    pub(crate) fn invalid_request(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
