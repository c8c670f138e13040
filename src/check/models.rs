//! Check data models

use serde::Deserialize;
use std::fmt;

/// Placeholder country code for a service that produced no data
pub const UNAVAILABLE: &str = "N/A";

/// A GeoIP endpoint to query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub url: String,
    /// Dotted key path into a JSON body. `None` selects the `key=value` trace parser.
    #[serde(default)]
    pub path: Option<String>,
}

impl ServiceDescriptor {
    /// Create a descriptor for a JSON endpoint
    pub fn json(name: &str, url: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            path: Some(path.to_string()),
        }
    }

    /// Create a descriptor for a `key=value` trace endpoint
    pub fn trace(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            path: None,
        }
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Outcome of a single fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    Failed(String),
    Timeout,
}

/// Result of querying one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub name: String,
    pub country_code: String,
    pub status: FetchStatus,
    pub response_time_ms: Option<u64>,
}

impl FetchResult {
    pub fn ok(name: String, country_code: String, response_time_ms: u64) -> Self {
        Self {
            name,
            country_code,
            status: FetchStatus::Ok,
            response_time_ms: Some(response_time_ms),
        }
    }

    pub fn failed(name: String, error: String) -> Self {
        Self {
            name,
            country_code: UNAVAILABLE.to_string(),
            status: FetchStatus::Failed(error),
            response_time_ms: None,
        }
    }

    pub fn timeout(name: String) -> Self {
        Self {
            name,
            country_code: UNAVAILABLE.to_string(),
            status: FetchStatus::Timeout,
            response_time_ms: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, FetchStatus::Ok)
    }

    /// Whether this result saw a country other than `target`
    pub fn disagrees_with(&self, target: &str) -> bool {
        self.is_ok() && self.country_code != target
    }
}

/// The baseline every other lookup is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryTarget {
    pub ip: String,
    pub country_code: String,
}

impl fmt::Display for PrimaryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ip, self.country_code)
    }
}

/// Outcome of the DNS resolver probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsOutcome {
    Located {
        resolver_ip: String,
        country_code: String,
    },
    /// The resolver sits on a loopback or private address, so it cannot be geolocated
    LocalResolver { resolver_ip: String },
    /// The lookup utility is not installed
    ToolMissing,
    Failed(String),
}
