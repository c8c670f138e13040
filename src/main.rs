use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use geo_consistency::{
    logging,
    report::{Catalog, Locale, Progress, Silent, Spinner},
    FetcherConfig, GeoLocator, ProbeConfig, ResolverStrategy, Runner, ServiceCatalog,
    ServiceFetcher,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Check whether GeoIP services and the DNS resolver agree on your exit country
#[derive(Parser)]
#[command(name = "geo-consistency", version)]
#[command(about = "Check whether GeoIP services and the DNS resolver agree on your exit country")]
struct Cli {
    /// Timeout in seconds for each request
    #[arg(long, default_value = "7")]
    timeout: u64,

    /// Number of concurrent requests
    #[arg(short = 'n', long, default_value = "16")]
    concurrency: usize,

    /// TOML file with the GeoIP services to query
    #[arg(short, long)]
    services: Option<PathBuf>,

    /// Endpoint used to establish the exit IP and target country
    #[arg(long)]
    primary_url: Option<String>,

    /// How to discover the DNS resolver
    #[arg(long, value_enum, default_value_t = ResolverStrategy::Dig)]
    resolver: ResolverStrategy,

    /// Lookup command used by the dig strategy
    #[arg(long, default_value = "dig")]
    dig_command: String,

    /// MaxMind database to check the exit IP against offline
    #[arg(long)]
    mmdb: Option<PathBuf>,

    /// Route all checks through this proxy (http, https or socks5 URL)
    #[arg(long)]
    proxy: Option<String>,

    /// Output language
    #[arg(long, value_enum, default_value_t = Locale::En)]
    lang: Locale,

    /// Do not show the progress spinner
    #[arg(long)]
    no_spinner: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Exit status for a rejected command line; help and version output are not errors
fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(usage_exit_code(&err));
        }
    };
    logging::init_cli_logger(cli.verbose);

    let services = match &cli.services {
        Some(path) => ServiceCatalog::load(path)
            .with_context(|| format!("Failed to load services from {:?}", path))?,
        None => ServiceCatalog::builtin(),
    };

    let mut config = FetcherConfig::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_concurrency(cli.concurrency);
    if let Some(url) = cli.primary_url {
        config = config.with_primary_url(url);
    }
    if let Some(proxy) = cli.proxy {
        config = config.with_proxy(proxy);
    }
    let fetcher = ServiceFetcher::with_config(config).context("Failed to build HTTP client")?;

    let probe = ProbeConfig::new()
        .with_strategy(cli.resolver)
        .with_command(cli.dig_command);

    let mut runner = Runner::new(fetcher, services, probe, Catalog::new(cli.lang));
    if let Some(path) = &cli.mmdb {
        let locator = GeoLocator::from_path(path)
            .with_context(|| format!("Failed to open MaxMind database {:?}", path))?;
        runner = runner.with_locator(locator);
    }

    let mut progress: Box<dyn Progress> = if cli.no_spinner {
        Box::new(Silent)
    } else {
        Box::new(Spinner::new())
    };

    let mut stdout = io::stdout().lock();
    runner.run(&mut stdout, progress.as_mut()).await?;

    Ok(())
}
