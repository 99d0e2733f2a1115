use anyhow::{Context, Result};
use clap::Parser;
use proxy_vault::{
    proxy::{FileStore, Harvester, ProxyChecker, ProxyCrawler, ProxySource},
    Config,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Harvests public proxy lists and keeps the proxies that actually forward traffic
#[derive(Parser)]
#[command(name = "proxy-vault")]
#[command(about = "Harvests public proxy lists and keeps the proxies that actually forward traffic")]
struct Cli {
    /// File of confirmed proxies, one host:port per line
    #[arg(short, long, default_value = "active.txt")]
    store: PathBuf,

    /// Seconds to wait between cycles
    #[arg(short, long, default_value = "300")]
    interval: u64,

    /// Per-attempt probe timeout in seconds
    #[arg(long, default_value = "3")]
    timeout: u64,

    /// URL fetched through each proxy; it must answer `success`
    #[arg(long, default_value = proxy_vault::proxy::checker::DEFAULT_CANARY_URL)]
    canary_url: String,

    /// Maximum number of probes in flight
    #[arg(short = 'n', long, default_value = "256")]
    concurrency: usize,

    /// Timeout in seconds for downloading a proxy list
    #[arg(long, default_value = "30")]
    fetch_timeout: u64,

    /// Proxy list URL to poll (can specify multiple)
    #[arg(short = 'u', long = "source")]
    sources: Vec<String>,

    /// File containing proxy list URLs (one URL per line)
    #[arg(short = 'f', long)]
    sources_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut sources: Vec<ProxySource> =
            self.sources.iter().map(|url| ProxySource::from_url(url)).collect();

        if let Some(path) = &self.sources_file {
            let from_file = ProxySource::from_file(path)
                .with_context(|| format!("reading sources file {:?}", path))?;
            info!("Loaded {} source URLs from {:?}", from_file.len(), path);
            sources.extend(from_file);
        }

        Ok(Config {
            store_path: self.store,
            interval: Duration::from_secs(self.interval),
            probe_timeout: Duration::from_secs(self.timeout),
            canary_url: self.canary_url,
            concurrency: self.concurrency,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            sources,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;

    let store = FileStore::open(&config.store_path)?;
    let crawler = ProxyCrawler::with_config(config.crawler_config(), config.resolved_sources())?;
    let checker = ProxyChecker::with_config(config.checker_config());

    info!(
        store = %config.store_path.display(),
        sources = crawler.sources().len(),
        interval_secs = config.interval.as_secs(),
        "Starting proxy harvester"
    );

    let mut harvester = Harvester::open(config.harvester_config(), crawler, store, checker)?;

    tokio::select! {
        _ = harvester.run() => {}
        _ = shutdown_signal() => info!("Shutting down"),
    }

    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
