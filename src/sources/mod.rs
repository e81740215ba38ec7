//! Citation sources.
//!
//! A [`CitationSource`] turns one DOI into one citation record with exactly
//! one request. Retries and pacing live in [`crate::fetcher`], not here, so a
//! source only has to report what happened: success, [`SourceError::RateLimited`],
//! or some other failure.
//!
//! - [`DoiOrgSource`]: content negotiation against the DOI resolver
//! - [`MockSource`]: scripted responses for tests

mod doi_org;
pub mod mock;

pub use doi_org::{DoiOrgSource, CSL_JSON_MEDIA_TYPE, DOI_ORG_BASE};
pub use mock::MockSource;

use crate::models::{CitationRecord, Doi};
use async_trait::async_trait;

/// Interface for anything that can resolve a DOI to a citation record.
#[async_trait]
pub trait CitationSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in logs)
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch the citation record for one DOI with a single request
    async fn fetch_citation(&self, doi: &Doi) -> Result<CitationRecord, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP 429 from the resolver
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Response body is not a JSON document
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    /// Whether the resolver asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
