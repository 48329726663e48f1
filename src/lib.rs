//! Fetchlane - adaptive priority-based resource-loading scheduler.
//!
//! Fetchlane decides, for a large number of competing resource fetches,
//! which may start now, which must wait, and how their priority changes as
//! the viewing context evolves. Admission is controlled per origin (scheme
//! + host + port), requests wait in band-ordered queues, and an external
//! visibility signal promotes requests as their consumers approach the
//! viewport. The crate is a pure in-process scheduling core: the actual
//! fetch is performed by an injected [`Transport`], and the visibility
//! signal arrives over a channel from whatever notifier the embedding
//! application uses.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  register / unregister   ┌──────────────────────────┐
//! │ UI layer   │ ───────────────────────► │      LoadScheduler       │
//! └────────────┘                          │  ┌──────────────────┐    │
//! ┌────────────┐   VisibilityEvent        │  │ OriginAdmission  │    │
//! │ Visibility │ ──► mpsc ──► Reclassifier│  ├──────────────────┤    │
//! │ Notifier   │                          │  │ OriginQueue (×N) │    │
//! └────────────┘                          │  └──────────────────┘    │
//! ┌────────────┐   complete(id, success)  │                          │
//! │ Transport  │ ◄──────────────────────► │  start(id, handle, hint) │
//! └────────────┘                          └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fetchlane::{LoadScheduler, PriorityBand, SchedulerConfig};
//!
//! let scheduler = Arc::new(LoadScheduler::new(
//!     SchedulerConfig::default(),
//!     Arc::new(HttpTransport::new()),
//! ));
//!
//! let id = scheduler.register(
//!     "https://cdn.example.com/listings/42/hero.jpg",
//!     PriorityBand::Low,
//!     Arc::new(image_element_handle),
//!     Some(Box::new(|| println!("loaded"))),
//!     None,
//! )?;
//!
//! // Later, as the element scrolls toward the viewport:
//! scheduler.promote_priority(id, PriorityBand::High);
//! ```

pub mod admission;
pub mod config;
pub mod error;
pub mod logging;
pub mod origin;
pub mod queue;
pub mod request;
pub mod scheduler;
pub mod stats;
pub mod transport;
pub mod visibility;

pub use config::{
    ConfigUpdate, SchedulerConfig, DEFAULT_MAX_CONCURRENT_PER_ORIGIN,
    DEFAULT_MEDIUM_PRIORITY_THRESHOLD,
};
pub use error::SchedulerError;
pub use origin::Origin;
pub use request::{LoadCallback, PriorityBand, RequestId, RequestState, ResourceHandle};
pub use scheduler::LoadScheduler;
pub use stats::{CountersSnapshot, SchedulerStats};
pub use transport::Transport;
pub use visibility::{
    classify, ReclassifierStats, ReclassifierStatsSnapshot, ViewportReclassifier, VisibilityEvent,
};

/// Version of the fetchlane library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
