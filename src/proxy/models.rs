//! Proxy data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unvalidated endpoint taken from a public proxy list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub host: String,
    pub port: String,
}

impl Candidate {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Registry key, identical to the line written to the store
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Forward-proxy URL the probe is routed through
    pub fn proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Why a candidate failed its probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Transport failure on both attempts
    ConnectFailure,
    /// A response came back but its body was not the canary text
    BadResponse,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ConnectFailure => write!(f, "connect-failure"),
            RejectReason::BadResponse => write!(f, "bad-response"),
        }
    }
}

/// Outcome of one candidate in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Confirmed,
    Rejected(RejectReason),
    AlreadyKnown,
}

impl ValidationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ValidationOutcome::Confirmed)
    }
}

/// Summary of a single ingest, validate and persist pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Raw lines handed over by the sources
    pub lines_read: usize,
    /// Lines that normalized into a candidate
    pub candidates: usize,
    /// Candidates skipped because they were confirmed before or repeated in this cycle
    pub already_known: usize,
    pub dispatched: usize,
    pub confirmed: usize,
    pub rejected_connect: usize,
    pub rejected_response: usize,
    /// Confirmations that reached the store and the registry
    pub persisted: usize,
    pub persist_failures: usize,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            lines_read: 0,
            candidates: 0,
            already_known: 0,
            dispatched: 0,
            confirmed: 0,
            rejected_connect: 0,
            rejected_response: 0,
            persisted: 0,
            persist_failures: 0,
        }
    }

    pub fn record(&mut self, outcome: ValidationOutcome) {
        match outcome {
            ValidationOutcome::Confirmed => self.confirmed += 1,
            ValidationOutcome::Rejected(RejectReason::ConnectFailure) => {
                self.rejected_connect += 1
            }
            ValidationOutcome::Rejected(RejectReason::BadResponse) => self.rejected_response += 1,
            ValidationOutcome::AlreadyKnown => self.already_known += 1,
        }
    }
}
