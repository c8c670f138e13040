//! DNS resolver probe for detecting DNS leaks
//!
//! Finds the resolver this host actually uses, then geolocates it with the
//! same fetcher the GeoIP checks use.

use crate::check::fetcher::ServiceFetcher;
use crate::check::models::{DnsOutcome, FetchStatus, ServiceDescriptor};
use crate::error::{CheckError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_COMMAND: &str = "dig";
const DEFAULT_PROBE_HOST: &str = "whoami.akamai.net";
const DEFAULT_PUBLIC_RESOLVER: &str = "resolver1.opendns.com";
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GEO_URL: &str = "http://ip-api.com/json/{ip}?fields=countryCode";
const DEFAULT_GEO_PATH: &str = "countryCode";

/// Name used for the resolver geolocation request in logs and results
const RESOLVER_SERVICE_NAME: &str = "DNS resolver";

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("Invalid IPv4 regex")
});

/// How the effective resolver address is discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResolverStrategy {
    /// Ask a public resolver who is asking, via an external lookup command
    #[default]
    Dig,
    /// Take the first name server from the system resolver configuration
    System,
}

/// Configuration for the resolver probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub strategy: ResolverStrategy,
    /// Lookup utility invoked by [`ResolverStrategy::Dig`]
    pub command: String,
    /// Hostname that answers with the address of the querying resolver
    pub probe_host: String,
    pub public_resolver: String,
    pub command_timeout: Duration,
    /// Geolocation endpoint; `{ip}` is replaced by the resolver address
    pub geo_url_template: String,
    pub geo_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::default(),
            command: DEFAULT_COMMAND.to_string(),
            probe_host: DEFAULT_PROBE_HOST.to_string(),
            public_resolver: DEFAULT_PUBLIC_RESOLVER.to_string(),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            geo_url_template: DEFAULT_GEO_URL.to_string(),
            geo_path: DEFAULT_GEO_PATH.to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: ResolverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_command(mut self, command: String) -> Self {
        self.command = command;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_geo_url_template(mut self, template: String) -> Self {
        self.geo_url_template = template;
        self
    }
}

pub struct ResolverProber {
    config: ProbeConfig,
    fetcher: ServiceFetcher,
}

impl ResolverProber {
    pub fn new(config: ProbeConfig, fetcher: ServiceFetcher) -> Self {
        Self { config, fetcher }
    }

    /// Find and geolocate the resolver. Never fails: errors become outcomes.
    pub async fn probe(&self) -> DnsOutcome {
        match self.resolver_ip().await {
            Ok(ip) if is_local_address(&ip) => {
                debug!(%ip, "resolver has a local address, not geolocating it");
                DnsOutcome::LocalResolver {
                    resolver_ip: ip.to_string(),
                }
            }
            Ok(ip) => self.locate(ip).await,
            Err(CheckError::ToolNotFound { command }) => {
                warn!(%command, "resolver lookup tool missing, skipping DNS check");
                DnsOutcome::ToolMissing
            }
            Err(e) => {
                debug!(error = %e, "resolver discovery failed");
                DnsOutcome::Failed(e.to_string())
            }
        }
    }

    /// Geolocate a known resolver address
    pub async fn locate(&self, ip: IpAddr) -> DnsOutcome {
        let url = self.config.geo_url_template.replace("{ip}", &ip.to_string());
        let service = ServiceDescriptor::json(RESOLVER_SERVICE_NAME, &url, &self.config.geo_path);
        let result = self.fetcher.fetch(&service).await;

        match result.status {
            FetchStatus::Ok => DnsOutcome::Located {
                resolver_ip: ip.to_string(),
                country_code: result.country_code,
            },
            FetchStatus::Timeout => DnsOutcome::Failed(format!("Geolocation of {ip} timed out")),
            FetchStatus::Failed(message) => {
                DnsOutcome::Failed(format!("Geolocation of {ip} failed: {message}"))
            }
        }
    }

    /// Discover the resolver address with the configured strategy
    pub async fn resolver_ip(&self) -> Result<IpAddr> {
        match self.config.strategy {
            ResolverStrategy::Dig => self.query_with_command().await.map(IpAddr::V4),
            ResolverStrategy::System => system_resolver_ip(),
        }
    }

    async fn query_with_command(&self) -> Result<Ipv4Addr> {
        let target = format!("@{}", self.config.public_resolver);
        let mut command = Command::new(&self.config.command);
        command
            .args(["+short", self.config.probe_host.as_str(), target.as_str()])
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.config.command_timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckError::ToolNotFound {
                    command: self.config.command.clone(),
                })
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(CheckError::Timeout(self.config.command_timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(command = %self.config.command, status = %output.status, "resolver lookup finished");
        parse_command_output(&stdout)
    }
}

/// Take the first line of lookup output and validate it as a dotted quad
pub fn parse_command_output(output: &str) -> Result<Ipv4Addr> {
    let first = output.lines().next().unwrap_or_default().trim();

    if !IPV4_REGEX.is_match(first) {
        return Err(CheckError::MalformedOutput {
            output: first.to_string(),
        });
    }

    first.parse().map_err(|_| CheckError::MalformedOutput {
        output: first.to_string(),
    })
}

/// Loopback, private, link-local and unspecified addresses have no public location
pub fn is_local_address(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified() || is_local_v6(v6),
    }
}

// fc00::/7 unique local and fe80::/10 link-local
fn is_local_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// First name server from the host resolver configuration
#[cfg(any(unix, target_os = "windows"))]
pub fn system_resolver_ip() -> Result<IpAddr> {
    let (config, _opts) = hickory_resolver::system_conf::read_system_conf()
        .map_err(|e| CheckError::config(format!("Cannot read system resolver config: {e}")))?;

    config
        .name_servers()
        .first()
        .map(|ns| ns.socket_addr.ip())
        .ok_or_else(|| CheckError::config("System resolver config lists no name servers"))
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn system_resolver_ip() -> Result<IpAddr> {
    Err(CheckError::config(
        "System resolver config is not available on this platform",
    ))
}
