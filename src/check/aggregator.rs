//! Compliance verdicts derived from a finished run

use crate::check::models::{DnsOutcome, FetchResult, PrimaryTarget};

/// Counts derived from all fetch results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTally {
    pub total: usize,
    pub successful: usize,
    pub mismatched: usize,
    pub errored: usize,
}

impl RunTally {
    pub fn from_results(results: &[FetchResult], target: &str) -> Self {
        let successful = results.iter().filter(|r| r.is_ok()).count();
        let mismatched = results.iter().filter(|r| r.disagrees_with(target)).count();

        Self {
            total: results.len(),
            successful,
            mismatched,
            errored: results.len() - successful,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    /// No evidence either way; does not affect the overall verdict
    Skipped,
}

impl Verdict {
    pub fn passed(self) -> bool {
        self == Verdict::Pass
    }
}

/// A service whose country disagrees with the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub name: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceReport {
    pub target: PrimaryTarget,
    pub tally: RunTally,
    pub discrepancies: Vec<Discrepancy>,
    pub geoip: Verdict,
    pub dns: Verdict,
}

impl ComplianceReport {
    pub fn evaluate(target: &PrimaryTarget, results: &[FetchResult], dns: &DnsOutcome) -> Self {
        let code = target.country_code.as_str();
        let tally = RunTally::from_results(results, code);

        let discrepancies = results
            .iter()
            .filter(|r| r.disagrees_with(code))
            .map(|r| Discrepancy {
                name: r.name.clone(),
                country_code: r.country_code.clone(),
            })
            .collect();

        let geoip = if tally.successful > 0 && tally.mismatched == 0 {
            Verdict::Pass
        } else {
            Verdict::Fail
        };

        let dns = match dns {
            DnsOutcome::Located { country_code, .. } if country_code == code => Verdict::Pass,
            DnsOutcome::Located { .. } | DnsOutcome::Failed(_) => Verdict::Fail,
            DnsOutcome::LocalResolver { .. } | DnsOutcome::ToolMissing => Verdict::Skipped,
        };

        Self {
            target: target.clone(),
            tally,
            discrepancies,
            geoip,
            dns,
        }
    }

    /// GeoIP must pass; DNS must not have failed
    pub fn passed(&self) -> bool {
        self.geoip.passed() && self.dns != Verdict::Fail
    }
}
