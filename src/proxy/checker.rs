//! Proxy checker probing candidates as HTTP forward proxies

use crate::error::HarvestError;
use crate::proxy::models::{Candidate, RejectReason, ValidationOutcome};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Default per-attempt timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Default cap on probes in flight
const DEFAULT_CONCURRENCY: usize = 256;

/// Default canary fetched through every candidate
pub const DEFAULT_CANARY_URL: &str =
    "https://raw.githubusercontent.com/wildyverando/ProxyChecker/main/stt.con";

/// Body the canary must return, whitespace aside
pub const EXPECTED_BODY: &str = "success";

/// Longest body excerpt kept in rejection messages
const BODY_EXCERPT_CHARS: usize = 64;

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each attempt
    pub timeout: Duration,
    /// Number of concurrent probes
    pub concurrency: usize,
    /// URL whose body must read `success`
    pub canary_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            canary_url: DEFAULT_CANARY_URL.to_string(),
        }
    }
}

impl CheckerConfig {
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

    pub fn with_canary_url(mut self, url: String) -> Self {
        self.canary_url = url;
        self
    }
}

/// Proxy checker for validating candidates
///
/// Stateless apart from its configuration: every probe builds its own client,
/// and the outcome is handed back to the caller rather than recorded here.
#[derive(Debug, Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single candidate
    pub async fn check_proxy(&self, candidate: &Candidate) -> ValidationOutcome {
        match self.probe(candidate).await {
            Ok(()) => {
                info!("[{}] Valid proxy found", candidate);
                ValidationOutcome::Confirmed
            }
            Err(e @ HarvestError::ProbeResponse { .. }) => {
                debug!("{}", e);
                ValidationOutcome::Rejected(RejectReason::BadResponse)
            }
            Err(e) => {
                debug!("{}", e);
                ValidationOutcome::Rejected(RejectReason::ConnectFailure)
            }
        }
    }

    /// Check many candidates concurrently, at most `concurrency` at a time
    ///
    /// Resolves only once every candidate has an outcome.
    pub async fn check_proxies(
        &self,
        candidates: Vec<Candidate>,
    ) -> Vec<(Candidate, ValidationOutcome)> {
        stream::iter(candidates)
            .map(|candidate| async move {
                let outcome = self.check_proxy(&candidate).await;
                (candidate, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    }

    /// One attempt plus a single retry on transport failure
    async fn probe(&self, candidate: &Candidate) -> Result<(), HarvestError> {
        let endpoint = candidate.key();

        let client = self
            .create_client(candidate)
            .map_err(|e| HarvestError::ProbeConnect {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let response = match self.fetch_canary(&client).await {
            Ok(response) => response,
            Err(first) => {
                debug!("[{}] First attempt failed ({}), retrying", endpoint, first);
                self.fetch_canary(&client)
                    .await
                    .map_err(|reason| HarvestError::ProbeConnect {
                        endpoint: endpoint.clone(),
                        reason,
                    })?
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::ProbeResponse {
                endpoint: endpoint.clone(),
                reason: format!("unreadable body: {}", e),
            })?;

        let body = body.trim();
        if body != EXPECTED_BODY {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            return Err(HarvestError::ProbeResponse {
                endpoint,
                reason: format!("body {:?}", excerpt),
            });
        }

        Ok(())
    }

    async fn fetch_canary(&self, client: &Client) -> Result<Response, String> {
        match tokio::time::timeout(
            self.config.timeout,
            client.get(&self.config.canary_url).send(),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.config.timeout)),
        }
    }

    /// Create a reqwest client routed through the candidate
    fn create_client(&self, candidate: &Candidate) -> reqwest::Result<Client> {
        let proxy = ReqwestProxy::all(candidate.proxy_url())?;

        Client::builder()
            .proxy(proxy)
            .timeout(self.config.timeout)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::testing::{refused_candidate, FakeProxy, CANARY_URL};

    fn fast_checker() -> ProxyChecker {
        ProxyChecker::with_config(
            CheckerConfig::new()
                .with_timeout(Duration::from_millis(300))
                .with_canary_url(CANARY_URL.to_string()),
        )
    }

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.canary_url, DEFAULT_CANARY_URL);
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(20)
            .with_canary_url("http://example.com".to_string());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.canary_url, "http://example.com");
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = CheckerConfig::new().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[tokio::test]
    async fn test_success_body_is_confirmed() {
        let proxy = FakeProxy::respond("success").await;
        let outcome = fast_checker().check_proxy(&proxy.candidate()).await;
        assert_eq!(outcome, ValidationOutcome::Confirmed);
        assert_eq!(proxy.connections(), 1);
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_trimmed() {
        let proxy = FakeProxy::respond("  success\n").await;
        let outcome = fast_checker().check_proxy(&proxy.candidate()).await;
        assert_eq!(outcome, ValidationOutcome::Confirmed);
    }

    #[tokio::test]
    async fn test_unexpected_body_is_bad_response() {
        let proxy = FakeProxy::respond("blocked").await;
        let outcome = fast_checker().check_proxy(&proxy.candidate()).await;
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::BadResponse)
        );
        // a response is not a transport failure, so no retry
        assert_eq!(proxy.connections(), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_failure() {
        let candidate = refused_candidate().await;
        let outcome = fast_checker().check_proxy(&candidate).await;
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::ConnectFailure)
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried_once() {
        let proxy = FakeProxy::drop_first("success").await;
        let outcome = fast_checker().check_proxy(&proxy.candidate()).await;
        assert_eq!(outcome, ValidationOutcome::Confirmed);
        assert_eq!(proxy.connections(), 2);
    }

    #[tokio::test]
    async fn test_hanging_proxy_times_out_after_retry() {
        let proxy = FakeProxy::hang().await;
        let outcome = fast_checker().check_proxy(&proxy.candidate()).await;
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::ConnectFailure)
        );
        assert_eq!(proxy.connections(), 2);
    }

    #[tokio::test]
    async fn test_check_proxies_reports_every_candidate() {
        let good = FakeProxy::respond("success").await;
        let bad = FakeProxy::respond("nope").await;
        let refused = refused_candidate().await;

        let checker = ProxyChecker::with_config(
            CheckerConfig::new()
                .with_timeout(Duration::from_millis(300))
                .with_concurrency(2)
                .with_canary_url(CANARY_URL.to_string()),
        );
        let results = checker
            .check_proxies(vec![good.candidate(), bad.candidate(), refused.clone()])
            .await;

        assert_eq!(results.len(), 3);
        let outcome_of = |c: &Candidate| {
            results
                .iter()
                .find(|(candidate, _)| candidate == c)
                .map(|(_, outcome)| *outcome)
        };
        assert_eq!(outcome_of(&good.candidate()), Some(ValidationOutcome::Confirmed));
        assert_eq!(
            outcome_of(&bad.candidate()),
            Some(ValidationOutcome::Rejected(RejectReason::BadResponse))
        );
        assert_eq!(
            outcome_of(&refused),
            Some(ValidationOutcome::Rejected(RejectReason::ConnectFailure))
        );
    }
}
