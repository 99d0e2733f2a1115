//! Error taxonomy for the harvesting pipeline
//!
//! Only [`HarvestError::StoreOpen`] is fatal. Every other variant is absorbed
//! where it happens and reported through `tracing`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// The durable store could not be opened or read at startup
    #[error("cannot open proxy store {path:?}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A candidate-list source was unreachable or unreadable
    #[error("failed to fetch proxy list from {source_name}: {reason}")]
    SourceFetch { source_name: String, reason: String },

    /// A raw line did not describe a `host:port` pair
    #[error("malformed proxy line {line:?}")]
    CandidateParse { line: String },

    /// The canary could not be reached through the proxy, retry included
    #[error("[{endpoint}] failed to reach canary: {reason}")]
    ProbeConnect { endpoint: String, reason: String },

    /// The canary answered through the proxy with something unexpected
    #[error("[{endpoint}] unexpected canary response: {reason}")]
    ProbeResponse { endpoint: String, reason: String },

    /// Appending to or syncing the durable store failed
    #[error("failed to persist {key}: {source}")]
    PersistenceWrite {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl HarvestError {
    /// Whether the process must stop instead of carrying on with the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarvestError::StoreOpen { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_open_is_fatal() {
        let fatal = HarvestError::StoreOpen {
            path: PathBuf::from("active.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(fatal.is_fatal());

        let parse = HarvestError::CandidateParse {
            line: "bad-entry".to_string(),
        };
        assert!(!parse.is_fatal());

        let write = HarvestError::PersistenceWrite {
            key: "1.2.3.4:8080".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert!(!write.is_fatal());
    }

    #[test]
    fn test_error_messages_name_the_endpoint() {
        let err = HarvestError::ProbeResponse {
            endpoint: "1.2.3.4:8080".to_string(),
            reason: "body \"blocked\"".to_string(),
        };
        assert!(err.to_string().starts_with("[1.2.3.4:8080]"));
    }
}
