//! Proxy crawler module for fetching raw candidate lists
//!
//! This module provides functionality for:
//! - Downloading public proxy lists over plain HTTP GET
//! - Skipping sources that fail without aborting the others
//! - Supplying fixed lines instead of network sources

use crate::error::HarvestError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Public lists polled when no sources are configured
const DEFAULT_SOURCE_URLS: &[&str] = &[
    "https://www.proxyscan.io/download?type=http",
    "https://www.proxyscan.io/download?type=https",
    "https://api.proxyscrape.com/?request=getproxies&proxytype=all&timeout=10000000&country=all&anonymity=all",
    "https://api.proxyscrape.com/?request=getproxies&proxytype=https&timeout=5000&country=all&ssl=all&anonymity=all",
    "https://api.proxyscrape.com/?request=getproxies&proxytype=http&timeout=5000&country=all&ssl=all&anonymity=all",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks4.txt",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks5.txt",
    "https://raw.githubusercontent.com/mertguvencli/http-proxy-list/main/proxy-list/data.txt",
    "https://raw.githubusercontent.com/ShiftyTR/Proxy-List/master/proxy.txt",
    "https://raw.githubusercontent.com/proxy4parsing/proxy-list/main/http.txt",
    "https://raw.githubusercontent.com/caliphdev/Proxy-List/master/http.txt",
    "https://raw.githubusercontent.com/caliphdev/Proxy-List/master/socks5.txt",
];

/// Something that hands the harvester one cycle's worth of raw list lines
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch every line from every source; failed sources contribute nothing
    async fn fetch_lines(&self) -> Vec<String>;
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Honor `HTTP_PROXY`-style environment variables when downloading lists
    pub system_proxy: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            system_proxy: true,
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }
}

/// Proxy source representing a website that provides proxy lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySource {
    /// Name of the proxy source
    pub name: String,
    /// URL to fetch proxies from
    pub url: String,
}

impl ProxySource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// Source named after the host part of its URL
    pub fn from_url(url: &str) -> Self {
        let name = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());
        Self::new(&name, url)
    }

    /// Read source URLs from a file, one per line
    ///
    /// Blank lines and `#` comments are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Self::from_url)
            .collect())
    }
}

/// Proxy crawler for fetching lists from websites
pub struct ProxyCrawler {
    sources: Vec<ProxySource>,
    client: Client,
}

impl ProxyCrawler {
    /// Create a crawler over the default public sources
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default(), Self::default_sources())
    }

    /// Create a crawler with custom configuration and sources
    pub fn with_config(config: CrawlerConfig, sources: Vec<ProxySource>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self { sources, client })
    }

    pub fn sources(&self) -> &[ProxySource] {
        &self.sources
    }

    /// Fetch the raw body of a single source
    pub async fn fetch_source(
        &self,
        source: &ProxySource,
    ) -> std::result::Result<String, HarvestError> {
        let fetch_error = |reason: String| HarvestError::SourceFetch {
            source_name: source.name.clone(),
            reason,
        };

        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP status: {}", status)));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }

    /// Get the list of public proxy sources polled by default
    pub fn default_sources() -> Vec<ProxySource> {
        DEFAULT_SOURCE_URLS
            .iter()
            .map(|url| ProxySource::from_url(url))
            .collect()
    }
}

#[async_trait]
impl CandidateSource for ProxyCrawler {
    async fn fetch_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for source in &self.sources {
            match self.fetch_source(source).await {
                Ok(body) => {
                    let before = lines.len();
                    lines.extend(body.lines().map(str::to_string));
                    info!("Fetched {} lines from {}", lines.len() - before, source.url);
                }
                Err(e) => warn!("{}", e),
            }
        }

        lines
    }
}

/// Fixed lines, handed out unchanged every cycle
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    lines: Vec<String>,
}

impl StaticSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn fetch_lines(&self) -> Vec<String> {
        self.lines.clone()
    }
}
