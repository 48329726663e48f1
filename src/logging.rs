//! Logging setup for applications embedding the scheduler.
//!
//! The library itself only emits `tracing` events; this helper wires a
//! console subscriber for binaries and examples that do not bring their
//! own. Verbosity is controlled through the `RUST_LOG` environment
//! variable, defaulting to `info`.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed, so
/// embedding applications and tests that configure their own logging are
/// left untouched.
pub fn init_logging() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
}
