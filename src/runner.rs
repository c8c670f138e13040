//! One complete consistency check, from primary lookup to verdict

use crate::check::{
    ComplianceReport, DnsOutcome, FanOut, FetchResult, GeoLocator, PrimaryTarget, ProbeConfig,
    ResolverProber, ServiceDescriptor, ServiceFetcher,
};
use crate::error::Result;
use crate::report::{track, Catalog, Message, Progress, Reporter};
use chrono::Local;
use std::io::Write;
use tracing::{error, info};

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub target: PrimaryTarget,
    pub results: Vec<FetchResult>,
    pub dns: DnsOutcome,
    pub report: ComplianceReport,
}

pub struct Runner {
    fetcher: ServiceFetcher,
    services: Vec<ServiceDescriptor>,
    probe: ProbeConfig,
    locator: Option<GeoLocator>,
    catalog: Catalog,
}

impl Runner {
    pub fn new(
        fetcher: ServiceFetcher,
        services: Vec<ServiceDescriptor>,
        probe: ProbeConfig,
        catalog: Catalog,
    ) -> Self {
        Self {
            fetcher,
            services,
            probe,
            locator: None,
            catalog,
        }
    }

    /// Also check the primary IP against a local database
    pub fn with_locator(mut self, locator: GeoLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Run every check and write the report to `out`.
    ///
    /// Fails only when the primary lookup fails (nothing is checked in that case)
    /// or when `out` cannot be written.
    pub async fn run<W: Write>(&self, out: &mut W, progress: &mut dyn Progress) -> Result<RunOutput> {
        let reporter = Reporter::new(&self.catalog);

        let target = match self.fetcher.fetch_primary().await {
            Ok(target) => target,
            Err(e) => {
                error!(error = %e, "primary lookup failed");
                reporter.primary_failed(out)?;
                return Err(e);
            }
        };
        info!(ip = %target.ip, code = %target.country_code, "primary target resolved");
        reporter.header(out, &target)?;

        let label = self.catalog.render(
            Message::ProgressServices,
            &[("count", self.services.len().to_string().as_str())],
        );
        let fan_out = FanOut::new(self.fetcher.clone());
        let mut results = track(&mut *progress, &label, fan_out.run(&self.services)).await;

        if let Some(locator) = &self.locator {
            results.push(locator.check(&target.ip));
        }
        reporter.results(out, &results, &target)?;

        let prober = ResolverProber::new(self.probe.clone(), self.fetcher.clone());
        let label = self.catalog.text(Message::ProgressDns);
        let dns = track(&mut *progress, &label, prober.probe()).await;
        reporter.dns(out, &dns)?;

        let report = ComplianceReport::evaluate(&target, &results, &dns);
        info!(
            successful = report.tally.successful,
            mismatched = report.tally.mismatched,
            passed = report.passed(),
            "run finished"
        );
        reporter.summary(out, &report, &dns)?;
        reporter.footer(out, Local::now())?;
        out.flush()?;

        Ok(RunOutput {
            target,
            results,
            dns,
            report,
        })
    }
}
