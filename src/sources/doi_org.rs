//! DOI resolver source using content negotiation.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::sync::Arc;

use crate::models::{CitationRecord, Doi};
use crate::sources::{CitationSource, SourceError};
use crate::utils::{validate_resolver_base, HttpClient, DEFAULT_USER_AGENT};

/// Public DOI resolver
pub const DOI_ORG_BASE: &str = "https://doi.org";

/// Media type asking the resolver for CSL-JSON
pub const CSL_JSON_MEDIA_TYPE: &str = "application/vnd.citationstyles.csl+json";

/// Fetches CSL-JSON records from the DOI resolver.
///
/// Each call issues `GET {base}/{urlencoded doi}` with the CSL-JSON `Accept`
/// header. Redirects to the registration agency are followed by the client.
#[derive(Debug, Clone)]
pub struct DoiOrgSource {
    client: Arc<HttpClient>,
    base_url: String,
    accept: String,
}

impl DoiOrgSource {
    /// Source for the public resolver with the default client label
    pub fn new() -> Result<Self, SourceError> {
        Self::with_options(DOI_ORG_BASE, DEFAULT_USER_AGENT, CSL_JSON_MEDIA_TYPE)
    }

    /// Source for a custom resolver base, client label and media type
    pub fn with_options(
        base_url: &str,
        user_agent: &str,
        accept: &str,
    ) -> Result<Self, SourceError> {
        let client = HttpClient::with_user_agent(user_agent)?;
        Self::with_client(Arc::new(client), base_url, accept)
    }

    /// Source sharing an existing client
    pub fn with_client(
        client: Arc<HttpClient>,
        base_url: &str,
        accept: &str,
    ) -> Result<Self, SourceError> {
        let base_url = validate_resolver_base(base_url)
            .map_err(|e| SourceError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            accept: accept.to_string(),
        })
    }

    /// URL requested for `doi`
    pub fn url_for(&self, doi: &Doi) -> String {
        format!("{}/{}", self.base_url, doi.url_encoded())
    }
}

#[async_trait]
impl CitationSource for DoiOrgSource {
    fn id(&self) -> &str {
        "doi_org"
    }

    fn name(&self) -> &str {
        "DOI resolver"
    }

    async fn fetch_citation(&self, doi: &Doi) -> Result<CitationRecord, SourceError> {
        let url = self.url_for(doi);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, &self.accept)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", doi, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read body for {}: {}", doi, e)))?;

        CitationRecord::from_slice(&body)
            .map_err(|e| SourceError::Parse(format!("{} did not return JSON: {}", doi, e)))
    }
}
