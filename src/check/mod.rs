//! Geolocation consistency checks
//!
//! This module provides functionality for:
//! - Extracting country codes from GeoIP service responses
//! - Querying many GeoIP services concurrently with per-request timeouts
//! - Probing the effective DNS resolver and geolocating it
//! - Comparing every result against the primary lookup

pub mod aggregator;
pub mod coordinator;
pub mod extractor;
pub mod fetcher;
pub mod mmdb;
pub mod models;
pub mod resolver;
pub mod services;

pub use aggregator::{ComplianceReport, Discrepancy, RunTally, Verdict};
pub use coordinator::FanOut;
pub use extractor::ResponseExtractor;
pub use fetcher::{FetcherConfig, ServiceFetcher};
pub use mmdb::GeoLocator;
pub use models::{
    DnsOutcome, FetchResult, FetchStatus, PrimaryTarget, ServiceDescriptor, UNAVAILABLE,
};
pub use resolver::{ProbeConfig, ResolverProber, ResolverStrategy};
pub use services::ServiceCatalog;
