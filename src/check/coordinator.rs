//! Concurrent fan-out across all configured services

use crate::check::fetcher::ServiceFetcher;
use crate::check::models::{FetchResult, ServiceDescriptor};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Runs the fetcher over a list of services with bounded concurrency
pub struct FanOut {
    fetcher: ServiceFetcher,
}

impl FanOut {
    pub fn new(fetcher: ServiceFetcher) -> Self {
        Self { fetcher }
    }

    /// Query every service and return one result per service, in input order.
    ///
    /// Requests complete in arbitrary order; each is tagged with its index and the
    /// batch is sorted once all of them are done.
    pub async fn run(&self, services: &[ServiceDescriptor]) -> Vec<FetchResult> {
        let concurrency = self.fetcher.config().concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let start = Instant::now();

        info!(services = services.len(), concurrency, "starting fan-out");

        let mut results = stream::iter(services.iter().enumerate())
            .map(|(index, service)| {
                let sem = Arc::clone(&semaphore);
                let fetcher = self.fetcher.clone();
                async move {
                    // The semaphore lives as long as this call and is never closed.
                    let _permit = sem.acquire().await.ok();
                    let result = fetcher.fetch(service).await;
                    debug!(index, service = %service.name, ok = result.is_ok(), "completed");
                    (index, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fan-out finished"
        );

        results.into_iter().map(|(_, result)| result).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::fetcher::FetcherConfig;
    use crate::check::models::{FetchStatus, UNAVAILABLE};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn fan_out(concurrency: usize, timeout: Duration) -> FanOut {
        let config = FetcherConfig::new()
            .with_concurrency(concurrency)
            .with_timeout(timeout);
        FanOut::new(ServiceFetcher::with_config(config).unwrap())
    }

    #[tokio::test]
    async fn test_results_follow_configured_order() {
        let server = MockServer::start_async().await;
        for (path, code, delay_ms) in [("/a", "US", 400), ("/b", "CA", 0), ("/c", "MX", 200)] {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(path);
                    then.status(200)
                        .delay(Duration::from_millis(delay_ms))
                        .header("content-type", "application/json")
                        .json_body(json!({ "country": code }));
                })
                .await;
        }

        let services: Vec<_> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| ServiceDescriptor::json(p, &server.url(*p), "country"))
            .collect();

        let results = fan_out(8, Duration::from_secs(5)).run(&services).await;

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["/a", "/b", "/c"]);
        let codes: Vec<_> = results.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["US", "CA", "MX"]);
    }

    #[tokio::test]
    async fn test_every_service_yields_one_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"country": "US"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(503);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .header("content-type", "application/json")
                    .json_body(json!({"country": "US"}));
            })
            .await;

        let services = vec![
            ServiceDescriptor::json("ok-1", &server.url("/ok"), "country"),
            ServiceDescriptor::json("broken", &server.url("/broken"), "country"),
            ServiceDescriptor::json("slow", &server.url("/slow"), "country"),
            ServiceDescriptor::json("ok-2", &server.url("/ok"), "country"),
            ServiceDescriptor::json("missing", &server.url("/ok"), "no.such.key"),
        ];

        let results = fan_out(2, Duration::from_millis(300)).run(&services).await;

        assert_eq!(results.len(), services.len());
        assert!(results[0].is_ok());
        assert!(matches!(results[1].status, FetchStatus::Failed(_)));
        assert_eq!(results[2].status, FetchStatus::Timeout);
        assert!(results[3].is_ok());
        assert_eq!(results[4].country_code, UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_wall_clock_tracks_slowest_request() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/wait");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .header("content-type", "application/json")
                    .json_body(json!({"country": "US"}));
            })
            .await;

        let services: Vec<_> = (0..6)
            .map(|i| ServiceDescriptor::json(&format!("s{i}"), &server.url("/wait"), "country"))
            .collect();

        let start = Instant::now();
        let results = fan_out(16, Duration::from_secs(5)).run(&services).await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(start.elapsed() < Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_empty_service_list() {
        let results = fan_out(4, Duration::from_secs(1)).run(&[]).await;
        assert!(results.is_empty());
    }
}
