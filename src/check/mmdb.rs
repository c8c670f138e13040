//! Offline country lookups against a MaxMind database

use crate::check::models::FetchResult;
use crate::error::{CheckError, Result};
use maxminddb::{geoip2, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Name reported for results produced from the local database
pub const LOCAL_DATABASE_NAME: &str = "Local MMDB";

/// Country information for an IP address
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountryInfo {
    /// ISO 3166-1 alpha-2 country code (e.g., "US", "CN")
    pub country_code: Option<String>,
    /// Country name in English
    pub country_name: Option<String>,
}

/// Looks up IP addresses in an MMDB file
#[derive(Clone)]
pub struct GeoLocator {
    reader: Arc<Reader<Vec<u8>>>,
}

impl GeoLocator {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader =
            Reader::open_readfile(path).map_err(|e| CheckError::Database(e.to_string()))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    pub fn lookup(&self, ip_str: &str) -> Result<CountryInfo> {
        let ip: IpAddr = ip_str
            .parse()
            .map_err(|_| CheckError::Database(format!("Invalid IP address: {ip_str}")))?;
        self.lookup_ip(ip)
    }

    pub fn lookup_ip(&self, ip: IpAddr) -> Result<CountryInfo> {
        let lookup_result = self
            .reader
            .lookup(ip)
            .map_err(|e| CheckError::Database(e.to_string()))?;

        let city: Option<geoip2::City> = lookup_result
            .decode()
            .map_err(|e| CheckError::Database(e.to_string()))?;

        let Some(city) = city else {
            return Ok(CountryInfo::default());
        };

        Ok(CountryInfo {
            country_code: city.country.iso_code.map(String::from),
            country_name: city.country.names.english.map(String::from),
        })
    }

    /// Look up `ip` and report it like any other service check
    pub fn check(&self, ip: &str) -> FetchResult {
        let start = Instant::now();
        let name = LOCAL_DATABASE_NAME.to_string();

        match self.lookup(ip) {
            Ok(CountryInfo {
                country_code: Some(code),
                ..
            }) => FetchResult::ok(name, code, start.elapsed().as_millis() as u64),
            Ok(_) => FetchResult::failed(name, format!("{ip} not present in database")),
            Err(e) => FetchResult::failed(name, e.to_string()),
        }
    }
}
