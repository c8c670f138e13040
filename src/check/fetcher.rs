//! Service fetcher for querying GeoIP endpoints

use crate::check::extractor::ResponseExtractor;
use crate::check::models::{FetchResult, PrimaryTarget, ServiceDescriptor, UNAVAILABLE};
use crate::error::{CheckError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default timeout for each request in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 7;

/// Default number of concurrent requests
const DEFAULT_CONCURRENCY: usize = 16;

/// Default endpoint establishing the exit IP and target country
const DEFAULT_PRIMARY_URL: &str = "http://ip-api.com/json/?fields=countryCode,query";

const PRIMARY_IP_PATH: &str = "query";
const PRIMARY_COUNTRY_PATH: &str = "countryCode";

const DEFAULT_USER_AGENT: &str = concat!("geo-consistency/", env!("CARGO_PKG_VERSION"));

/// Configuration for the service fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout for each request
    pub timeout: Duration,
    /// Number of requests in flight during a fan-out
    pub concurrency: usize,
    /// Endpoint for the primary lookup
    pub primary_url: String,
    /// Optional outbound proxy (http, https or socks5 URL)
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_primary_url(mut self, url: String) -> Self {
        self.primary_url = url;
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

/// Response body plus the content-type sniff result
struct Body {
    text: String,
    is_json: bool,
}

/// Issues bounded-timeout GETs and turns them into [`FetchResult`]s
#[derive(Clone)]
pub struct ServiceFetcher {
    config: FetcherConfig,
    client: Client,
}

impl ServiceFetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a new fetcher with custom configuration
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Self::create_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Query one service. Never fails: errors become sentinel results.
    pub async fn fetch(&self, service: &ServiceDescriptor) -> FetchResult {
        let start = Instant::now();

        let body = match self.get_body(&service.url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(service = %service.name, error = %e, "fetch failed");
                return match e {
                    CheckError::Timeout(_) => FetchResult::timeout(service.name.clone()),
                    CheckError::Network(ref err) if err.is_timeout() => {
                        FetchResult::timeout(service.name.clone())
                    }
                    other => FetchResult::failed(service.name.clone(), other.to_string()),
                };
            }
        };

        match ResponseExtractor::extract(&body.text, body.is_json, service.path.as_deref()) {
            Some(code) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(service = %service.name, %code, elapsed_ms = elapsed, "fetch ok");
                FetchResult::ok(service.name.clone(), code, elapsed)
            }
            None => {
                debug!(service = %service.name, json = body.is_json, "country code not found");
                FetchResult::failed(
                    service.name.clone(),
                    "Country code not found in response".to_string(),
                )
            }
        }
    }

    /// Resolve the exit IP and its country. Any failure here is fatal for a run.
    pub async fn fetch_primary(&self) -> Result<PrimaryTarget> {
        let body = self
            .get_body(&self.config.primary_url)
            .await
            .map_err(|e| CheckError::primary(e.to_string()))?;

        let country_code =
            ResponseExtractor::extract(&body.text, body.is_json, Some(PRIMARY_COUNTRY_PATH))
                .ok_or_else(|| CheckError::primary("no country code in response"))?;

        let ip = ResponseExtractor::extract(&body.text, body.is_json, Some(PRIMARY_IP_PATH))
            .unwrap_or_else(|| {
                warn!("primary lookup returned no IP address");
                UNAVAILABLE.to_string()
            });

        Ok(PrimaryTarget { ip, country_code })
    }

    async fn get_body(&self, url: &str) -> Result<Body> {
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CheckError::Status(status));
            }

            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_ascii_lowercase().contains("json"))
                .unwrap_or(false);
            let text = response.text().await?;

            Ok(Body { text, is_json })
        };

        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::Timeout(self.config.timeout)),
        }
    }

    /// Create a reqwest client, routed through the configured proxy if any
    fn create_client(config: &FetcherConfig) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if let Some(proxy_url) = &config.proxy {
            builder = builder.proxy(ReqwestProxy::all(proxy_url)?);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::models::FetchStatus;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fetcher(timeout: Duration) -> ServiceFetcher {
        ServiceFetcher::with_config(FetcherConfig::new().with_timeout(timeout)).unwrap()
    }

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.primary_url, DEFAULT_PRIMARY_URL);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_fetcher_config_builder() {
        let config = FetcherConfig::new()
            .with_timeout(Duration::from_secs(15))
            .with_concurrency(0)
            .with_primary_url("http://example.com/me".to_string())
            .with_proxy("socks5://127.0.0.1:1080".to_string());

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.primary_url, "http://example.com/me");
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[tokio::test]
    async fn test_fetch_json_nested_path() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/geo");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"location": {"country": {"code": "SE"}}}));
            })
            .await;

        let service = ServiceDescriptor::json("reg", &server.url("/geo"), "location.country.code");
        let result = fetcher(Duration::from_secs(5)).fetch(&service).await;

        assert!(result.is_ok());
        assert_eq!(result.country_code, "SE");
        assert!(result.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_fetch_trace_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cdn-cgi/trace");
                then.status(200)
                    .header("content-type", "text/plain")
                    .body("ip=203.0.113.9\nloc=JP\nwarp=off\n");
            })
            .await;

        let service = ServiceDescriptor::trace("cf", &server.url("/cdn-cgi/trace"));
        let result = fetcher(Duration::from_secs(5)).fetch(&service).await;

        assert_eq!(result.status, FetchStatus::Ok);
        assert_eq!(result.country_code, "JP");
    }

    #[tokio::test]
    async fn test_fetch_json_needs_json_content_type() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/plain");
                then.status(200)
                    .header("content-type", "text/plain")
                    .body(r#"{"country": "US"}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/charset");
                then.status(200)
                    .header("content-type", "application/json; charset=utf-8")
                    .body(r#"{"country": "US"}"#);
            })
            .await;

        let fetcher = fetcher(Duration::from_secs(5));

        let plain = ServiceDescriptor::json("plain", &server.url("/plain"), "country");
        let result = fetcher.fetch(&plain).await;
        assert!(matches!(result.status, FetchStatus::Failed(_)));

        let charset = ServiceDescriptor::json("charset", &server.url("/charset"), "country");
        let result = fetcher.fetch(&charset).await;
        assert!(result.is_ok());
        assert_eq!(result.country_code, "US");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/limited");
                then.status(429)
                    .header("content-type", "application/json")
                    .json_body(json!({"country": "US"}));
            })
            .await;

        let service = ServiceDescriptor::json("limited", &server.url("/limited"), "country");
        let result = fetcher(Duration::from_secs(5)).fetch(&service).await;

        assert!(!result.is_ok());
        assert_eq!(result.country_code, UNAVAILABLE);
        assert!(matches!(result.status, FetchStatus::Failed(ref m) if m.contains("429")));
    }

    #[tokio::test]
    async fn test_fetch_slow_endpoint_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .header("content-type", "application/json")
                    .json_body(json!({"country": "US"}));
            })
            .await;

        let service = ServiceDescriptor::json("slow", &server.url("/slow"), "country");
        let result = fetcher(Duration::from_millis(200)).fetch(&service).await;

        assert_eq!(result.status, FetchStatus::Timeout);
        assert_eq!(result.country_code, UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_fetch_missing_key_is_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/odd");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"error": true}));
            })
            .await;

        let service = ServiceDescriptor::json("odd", &server.url("/odd"), "country");
        let result = fetcher(Duration::from_secs(5)).fetch(&service).await;

        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_not_ok() {
        let service = ServiceDescriptor::json("down", "http://127.0.0.1:1/json", "country");
        let result = fetcher(Duration::from_secs(2)).fetch(&service).await;
        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_primary() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"countryCode": "US", "query": "198.51.100.7"}));
            })
            .await;

        let config = FetcherConfig::new().with_primary_url(server.url("/json/"));
        let target = ServiceFetcher::with_config(config)
            .unwrap()
            .fetch_primary()
            .await
            .unwrap();

        assert_eq!(target.country_code, "US");
        assert_eq!(target.ip, "198.51.100.7");
    }

    #[tokio::test]
    async fn test_fetch_primary_without_country_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"status": "fail"}));
            })
            .await;

        let config = FetcherConfig::new().with_primary_url(server.url("/json/"));
        let err = ServiceFetcher::with_config(config)
            .unwrap()
            .fetch_primary()
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::PrimaryLookup { .. }));
    }
}
