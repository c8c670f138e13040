//! Geo Consistency - VPN/proxy leak checker
//!
//! Establishes the country of the current exit IP, then asks many independent
//! GeoIP services and the DNS resolver's location whether they agree.

pub mod check;
pub mod error;
pub mod logging;
pub mod report;
pub mod runner;

pub use check::*;
pub use error::{CheckError, Result};
pub use runner::{RunOutput, Runner};
