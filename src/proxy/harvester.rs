//! Cycle coordinator: ingest, filter, validate, persist, sleep, repeat

use crate::error::HarvestError;
use crate::proxy::checker::ProxyChecker;
use crate::proxy::crawler::CandidateSource;
use crate::proxy::models::{Candidate, CycleReport, ValidationOutcome};
use crate::proxy::parser::CandidateParser;
use crate::proxy::registry::Registry;
use crate::proxy::store::ProxyStore;
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, info_span, Instrument};

/// Default pause between cycles in seconds
const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Configuration for the cycle loop
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// Pause after each completed cycle
    pub interval: Duration,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

impl HarvesterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Long-lived harvesting session
///
/// Owns the registry and the store; probes only report outcomes back, and
/// all registry and store mutation happens here, after the batch has joined.
pub struct Harvester<S, T> {
    config: HarvesterConfig,
    source: S,
    store: T,
    registry: Registry,
    checker: ProxyChecker,
    cycles: u64,
}

impl<S, T> Harvester<S, T>
where
    S: CandidateSource,
    T: ProxyStore,
{
    /// Seed the registry from `store` and build a session around it
    ///
    /// Fails only when the store cannot be read, which must stop the process.
    pub fn open(
        config: HarvesterConfig,
        source: S,
        mut store: T,
        checker: ProxyChecker,
    ) -> Result<Self, HarvestError> {
        let registry = Registry::load_from(&mut store)?;
        info!("Loaded {} confirmed proxies from store", registry.len());

        Ok(Self {
            config,
            source,
            store,
            registry,
            checker,
            cycles: 0,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run cycles forever, sleeping `interval` between them
    pub async fn run(&mut self) {
        loop {
            self.run_cycle().await;
            debug!("Sleeping {:?} until next cycle", self.config.interval);
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// One full ingest, validate and persist pass
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let span = info_span!("cycle", n = self.cycles);
        let report = self.cycle().instrument(span.clone()).await;

        span.in_scope(|| {
            info!(
                lines = report.lines_read,
                candidates = report.candidates,
                known = report.already_known,
                dispatched = report.dispatched,
                confirmed = report.confirmed,
                persisted = report.persisted,
                "Cycle complete"
            )
        });
        report
    }

    async fn cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::new(Utc::now());

        let lines = self.source.fetch_lines().await;
        report.lines_read = lines.len();

        let pending = self.dispatch_set(&lines, &mut report);
        report.dispatched = pending.len();
        info!("Checking {} new proxies", pending.len());

        let results = self.checker.check_proxies(pending).await;

        let mut confirmed = Vec::new();
        for (candidate, outcome) in results {
            report.record(outcome);
            if outcome.is_confirmed() {
                confirmed.push(candidate);
            }
        }

        self.drain(confirmed, &mut report);
        report
    }

    /// Candidates that still need a probe this cycle
    fn dispatch_set(&self, lines: &[String], report: &mut CycleReport) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for candidate in CandidateParser::candidates(lines.iter().map(String::as_str)) {
            report.candidates += 1;
            let key = candidate.key();

            if self.registry.contains(&key) {
                debug!("[{}] Proxy already confirmed", key);
                report.record(ValidationOutcome::AlreadyKnown);
                continue;
            }
            if !seen.insert(key) {
                report.record(ValidationOutcome::AlreadyKnown);
                continue;
            }

            pending.push(candidate);
        }

        pending
    }

    /// Append confirmations in order, sync once, then admit them to the registry
    fn drain(&mut self, confirmed: Vec<Candidate>, report: &mut CycleReport) {
        let mut appended = Vec::with_capacity(confirmed.len());

        for candidate in confirmed {
            let key = candidate.key();
            match self.store.append(&key) {
                Ok(()) => appended.push(key),
                Err(e) => {
                    error!("{}", e);
                    report.persist_failures += 1;
                }
            }
        }

        if appended.is_empty() {
            return;
        }

        if let Err(e) = self.store.sync() {
            error!("{}", e);
            report.persist_failures += appended.len();
            return;
        }

        for key in appended {
            self.registry.insert(key);
            report.persisted += 1;
        }
    }
}
