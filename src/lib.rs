//! Proxy Vault - Proxy Harvester and Checker
//!
//! Periodically pulls public proxy lists, probes every endpoint it has not
//! already confirmed, and appends the working ones to a plain-text store.

pub mod error;
pub mod proxy;

pub use error::HarvestError;
pub use proxy::*;

use std::path::PathBuf;
use std::time::Duration;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Store of confirmed proxies
    pub store_path: PathBuf,
    /// Pause between cycles
    pub interval: Duration,
    /// Per-attempt probe timeout
    pub probe_timeout: Duration,
    /// URL fetched through every candidate
    pub canary_url: String,
    /// Probes in flight at once
    pub concurrency: usize,
    /// Timeout for downloading a source list
    pub fetch_timeout: Duration,
    /// Lists to poll; empty means the built-in ones
    pub sources: Vec<ProxySource>,
}

impl Default for Config {
    fn default() -> Self {
        let checker = CheckerConfig::default();
        let crawler = CrawlerConfig::default();
        Self {
            store_path: PathBuf::from("active.txt"),
            interval: HarvesterConfig::default().interval,
            probe_timeout: checker.timeout,
            canary_url: checker.canary_url,
            concurrency: checker.concurrency,
            fetch_timeout: crawler.timeout,
            sources: Vec::new(),
        }
    }
}

impl Config {
    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::new()
            .with_timeout(self.probe_timeout)
            .with_concurrency(self.concurrency)
            .with_canary_url(self.canary_url.clone())
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::new().with_timeout(self.fetch_timeout)
    }

    pub fn harvester_config(&self) -> HarvesterConfig {
        HarvesterConfig::new().with_interval(self.interval)
    }

    /// Configured sources, or the built-in list when none were given
    pub fn resolved_sources(&self) -> Vec<ProxySource> {
        if self.sources.is_empty() {
            ProxyCrawler::default_sources()
        } else {
            self.sources.clone()
        }
    }
}
