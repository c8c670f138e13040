//! Colored console rendering of check results

use crate::check::{ComplianceReport, DnsOutcome, FetchResult, FetchStatus, PrimaryTarget, Verdict};
use crate::report::i18n::{Catalog, Message};
use chrono::{DateTime, Local};
use crossterm::style::Stylize;
use std::io::{self, Write};

const SEPARATOR_WIDTH: usize = 40;

/// Title colors cycled across service blocks
const TITLE_COLORS: [crossterm::style::Color; 6] = [
    crossterm::style::Color::Cyan,
    crossterm::style::Color::Green,
    crossterm::style::Color::Yellow,
    crossterm::style::Color::Magenta,
    crossterm::style::Color::Blue,
    crossterm::style::Color::White,
];

/// Writes the human-readable report using a message catalog
pub struct Reporter<'a> {
    catalog: &'a Catalog,
}

impl<'a> Reporter<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    fn separator(out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
    }

    pub fn header(&self, out: &mut impl Write, target: &PrimaryTarget) -> io::Result<()> {
        let line = self.catalog.render(
            Message::Header,
            &[("ip", target.ip.as_str()), ("code", target.country_code.as_str())],
        );
        writeln!(out, "{}", line.bold().black().on_white())?;
        Self::separator(out)
    }

    /// One block per result, flagging any that disagree with `target`
    pub fn results(
        &self,
        out: &mut impl Write,
        results: &[FetchResult],
        target: &PrimaryTarget,
    ) -> io::Result<()> {
        for (index, result) in results.iter().enumerate() {
            let title = self
                .catalog
                .render(Message::ServiceTitle, &[("name", result.name.as_str())]);
            let color = TITLE_COLORS[index % TITLE_COLORS.len()];
            writeln!(out, "{}", title.with(color).bold())?;

            match &result.status {
                FetchStatus::Ok => {
                    let line = self
                        .catalog
                        .render(Message::CountryCode, &[("code", result.country_code.as_str())]);
                    writeln!(out, "{line}")?;

                    if let Some(ms) = result.response_time_ms {
                        let line = self
                            .catalog
                            .render(Message::ResponseTime, &[("ms", ms.to_string().as_str())]);
                        writeln!(out, "{}", line.dark_grey())?;
                    }

                    if result.disagrees_with(&target.country_code) {
                        let line = self
                            .catalog
                            .render(Message::Mismatch, &[("code", target.country_code.as_str())]);
                        writeln!(out, "{}", line.red().bold())?;
                    }
                }
                FetchStatus::Timeout => {
                    writeln!(out, "{}", self.catalog.text(Message::FetchTimedOut).red())?;
                }
                FetchStatus::Failed(error) => {
                    let line = self
                        .catalog
                        .render(Message::FetchFailed, &[("error", error.as_str())]);
                    writeln!(out, "{}", line.red())?;
                }
            }

            Self::separator(out)?;
        }

        Ok(())
    }

    pub fn dns(&self, out: &mut impl Write, outcome: &DnsOutcome) -> io::Result<()> {
        writeln!(out, "{}", self.catalog.text(Message::DnsTitle).white().bold())?;

        match outcome {
            DnsOutcome::Located {
                resolver_ip,
                country_code,
            } => {
                writeln!(
                    out,
                    "{}",
                    self.catalog.render(Message::ResolverIp, &[("ip", resolver_ip.as_str())])
                )?;
                writeln!(
                    out,
                    "{}",
                    self.catalog
                        .render(Message::ResolverCountry, &[("code", country_code.as_str())])
                )?;
            }
            DnsOutcome::LocalResolver { resolver_ip } => {
                let line = self
                    .catalog
                    .render(Message::DnsLocalResolver, &[("ip", resolver_ip.as_str())]);
                writeln!(out, "{}", line.black().on_yellow())?;
            }
            DnsOutcome::ToolMissing => {
                let line = self.catalog.text(Message::DnsToolMissing);
                writeln!(out, "{}", line.black().on_yellow())?;
            }
            DnsOutcome::Failed(error) => {
                let line = self.catalog.render(Message::DnsFailed, &[("error", error.as_str())]);
                writeln!(out, "{}", line.red())?;
            }
        }

        Self::separator(out)
    }

    pub fn summary(
        &self,
        out: &mut impl Write,
        report: &ComplianceReport,
        dns: &DnsOutcome,
    ) -> io::Result<()> {
        let code = report.target.country_code.as_str();
        let ok = report.tally.successful.to_string();
        let total = report.tally.total.to_string();

        writeln!(out)?;
        writeln!(out, "{}", self.catalog.text(Message::SummaryTitle).white().bold())?;

        let args = [("ok", ok.as_str()), ("total", total.as_str()), ("code", code)];
        if report.geoip.passed() {
            let line = self.catalog.render(Message::GeoipPass, &args);
            writeln!(out, "{}", format!("✅ {line}").black().on_green())?;
        } else {
            let line = self.catalog.render(Message::GeoipFail, &args);
            writeln!(out, "{}", format!("❌ {line}").white().on_red())?;
            for discrepancy in &report.discrepancies {
                let line = self.catalog.render(
                    Message::DiscrepancyLine,
                    &[
                        ("name", discrepancy.name.as_str()),
                        ("code", discrepancy.country_code.as_str()),
                    ],
                );
                writeln!(out, "{}", line.red())?;
            }
        }

        match (report.dns, dns) {
            (Verdict::Pass, _) => {
                let line = self.catalog.render(Message::DnsPass, &[("code", code)]);
                writeln!(out, "{}", format!("✅ {line}").black().on_green())?;
            }
            (Verdict::Fail, DnsOutcome::Located { country_code, .. }) => {
                let line = self
                    .catalog
                    .render(Message::DnsLeak, &[("code", code), ("dns", country_code.as_str())]);
                writeln!(out, "{}", format!("❌ {line}").white().on_red())?;
            }
            (Verdict::Fail, _) => {
                let line = self.catalog.text(Message::DnsError);
                writeln!(out, "{}", format!("❌ {line}").white().on_red())?;
            }
            (Verdict::Skipped, DnsOutcome::LocalResolver { resolver_ip }) => {
                let line = self
                    .catalog
                    .render(Message::DnsLocalSkipped, &[("ip", resolver_ip.as_str())]);
                writeln!(out, "{}", format!("⚠ {line}").black().on_yellow())?;
            }
            (Verdict::Skipped, _) => {
                let line = self.catalog.text(Message::DnsSkipped);
                writeln!(out, "{}", format!("⚠ {line}").black().on_yellow())?;
            }
        }

        writeln!(out)?;
        if report.passed() {
            let line = self.catalog.text(Message::OverallPass);
            writeln!(out, "{}", format!("🚀 {line}").white().on_blue())
        } else {
            let line = self.catalog.text(Message::OverallFail);
            writeln!(out, "{}", format!("⚠ {line}").black().on_yellow())
        }
    }

    pub fn footer(&self, out: &mut impl Write, at: DateTime<Local>) -> io::Result<()> {
        let time = at.format("%Y-%m-%d %H:%M:%S %Z").to_string();
        let line = self.catalog.render(Message::CheckedAt, &[("time", time.as_str())]);
        writeln!(out, "{}", line.dark_grey())
    }

    pub fn primary_failed(&self, out: &mut impl Write) -> io::Result<()> {
        let line = self.catalog.text(Message::PrimaryFailed);
        writeln!(out, "{}", line.white().on_red())
    }
}
