//! Candidate parser turning raw list lines into candidates

use crate::error::HarvestError;
use crate::proxy::models::Candidate;
use tracing::{debug, warn};

/// Marker some list providers put in the body instead of a proxy list
pub const ERROR_MARKER: &str = "error code";

/// Candidate parser for the plain `host:port` list format
pub struct CandidateParser;

impl CandidateParser {
    /// Parse a single list line
    ///
    /// Returns `Ok(None)` for lines that carry nothing (blank, comment, or an
    /// upstream error page), and an error for lines that look like an entry
    /// but have no `host:port` shape. Fields after the port are ignored, so
    /// `ip:port:user:pass` yields `ip:port`.
    pub fn parse_line(line: &str) -> Result<Option<Candidate>, HarvestError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        if line.contains(ERROR_MARKER) {
            warn!("Proxy list error {}", line);
            return Ok(None);
        }

        let mut fields = line.split(':');
        match (fields.next(), fields.next()) {
            (Some(host), Some(port)) if !host.trim().is_empty() && !port.trim().is_empty() => {
                Ok(Some(Candidate::new(host.trim(), port.trim())))
            }
            _ => Err(HarvestError::CandidateParse {
                line: line.to_string(),
            }),
        }
    }

    /// Lazily normalize a batch of lines, discarding anything malformed
    pub fn candidates<'a, I>(lines: I) -> impl Iterator<Item = Candidate> + 'a
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: 'a,
    {
        lines
            .into_iter()
            .filter_map(|line| match Self::parse_line(line) {
                Ok(candidate) => candidate,
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            })
    }
}
