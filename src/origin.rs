//! Resource origins: the unit of admission control.
//!
//! Requests are admission-controlled per origin rather than globally, so a
//! slow or saturated host never starves fetches from other hosts. An origin
//! is the authority component of the resource URL: scheme and host, plus
//! the port when one is spelled out and differs from the scheme default.

use std::fmt;

use url::Url;

use crate::error::SchedulerError;

/// Authority component of a resource URL.
///
/// Two URLs share an origin exactly when they share scheme, host, and
/// effective port, which is the grouping the per-origin admission ceiling
/// applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Derives the origin from a resource URL.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidRequest`] for empty, relative, or
    /// host-less URLs. The scheduler has no base-URL context to resolve
    /// relative references against, and schemes without an authority
    /// (`data:`, `mailto:`) have no origin to admission-control.
    pub fn parse(raw: &str) -> Result<Self, SchedulerError> {
        if raw.trim().is_empty() {
            return Err(SchedulerError::invalid_request(raw, "URL is empty"));
        }

        let url = Url::parse(raw)
            .map_err(|source| SchedulerError::invalid_request(raw, source.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| SchedulerError::invalid_request(raw, "URL has no host"))?;

        // Url::port() is None for the scheme's default port, so defaults
        // collapse onto the bare scheme://host form.
        let origin = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        Ok(Self(origin))
    }

    /// Returns the origin as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
