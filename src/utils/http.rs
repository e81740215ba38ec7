//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SourceError;

/// Default client label sent as `User-Agent`.
///
/// Carries no contact address; set `http.user_agent` to something like
/// `"My Site (mailto:me@example.com)"` for the resolver's polite pool.
pub const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (personal website bibliography)"
);

/// Whether a `User-Agent` carries a contact address
pub fn has_contact(user_agent: &str) -> bool {
    let Some((_, rest)) = user_agent.split_once("mailto:") else {
        return false;
    };
    let address = rest
        .split(|c: char| c == ')' || c == ';' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    matches!(address.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

/// Shared HTTP client.
///
/// No overall request timeout is configured: a resolver that accepts the
/// connection but never answers stalls the caller. Only connection setup is
/// bounded.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, SourceError> {
        if !has_contact(user_agent) {
            tracing::warn!(
                "User-Agent '{}' has no mailto: contact; set http.user_agent to identify yourself to the resolver",
                user_agent
            );
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}
