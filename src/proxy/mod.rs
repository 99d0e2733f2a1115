//! Proxy module for harvesting and validating public proxies
//!
//! This module provides functionality for:
//! - Fetching raw proxy lists from public sources
//! - Normalizing list lines into `host:port` candidates
//! - Probing candidates as HTTP forward proxies with bounded concurrency
//! - Persisting confirmed proxies to an append-only store without duplicates

pub mod checker;
pub mod crawler;
pub mod harvester;
pub mod models;
pub mod parser;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use checker::{CheckerConfig, ProxyChecker};
pub use crawler::{CandidateSource, CrawlerConfig, ProxyCrawler, ProxySource, StaticSource};
pub use harvester::{Harvester, HarvesterConfig};
pub use models::{Candidate, CycleReport, RejectReason, ValidationOutcome};
pub use parser::CandidateParser;
pub use registry::Registry;
pub use store::{FileStore, ProxyStore};
