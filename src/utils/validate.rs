//! Input validation for DOIs and the resolver base URL.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Validate and normalize a DOI
///
/// DOIs have the format "10.xxxx/xxxxxx" where xxxx is a registrant code
/// and xxxxxx is an item ID. Resolver prefixes (`doi:`, `https://doi.org/`)
/// are stripped and the result is lowercased, since DOIs are case-insensitive.
pub fn validate_doi(doi: &str) -> Result<String, ValidationError> {
    let doi = doi.trim().to_lowercase();

    if doi.is_empty() {
        return Err(ValidationError::InvalidDoi("empty DOI".to_string()));
    }

    let doi = doi.strip_prefix("doi:").unwrap_or(&doi);
    let doi = doi.strip_prefix("https://doi.org/").unwrap_or(doi);
    let doi = doi.strip_prefix("http://doi.org/").unwrap_or(doi);

    if !doi.starts_with("10.") {
        return Err(ValidationError::InvalidDoi(
            "DOI must start with '10.'".to_string(),
        ));
    }

    let Some((prefix, suffix)) = doi.split_once('/') else {
        return Err(ValidationError::InvalidDoi(
            "DOI must contain a slash".to_string(),
        ));
    };

    if prefix.len() <= 3 || suffix.is_empty() {
        return Err(ValidationError::InvalidDoi(
            "DOI needs a registrant code and an item ID".to_string(),
        ));
    }

    if doi.contains("..") {
        return Err(ValidationError::InvalidDoi(
            "path traversal detected".to_string(),
        ));
    }

    if doi.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidDoi(
            "contains whitespace or control characters".to_string(),
        ));
    }

    Ok(doi.to_string())
}

/// Validate the resolver base URL from configuration
///
/// Must be an absolute http(s) URL with a host and no query or fragment, so
/// that `{base}/{doi}` always puts the DOI in the path. A trailing slash is
/// removed so that the join never produces a double slash.
pub fn validate_resolver_base(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("empty URL".to_string()));
    }

    // The URL parser silently drops tabs and newlines, so check the raw input
    if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidUrl(
            "contains whitespace or control characters".to_string(),
        ));
    }

    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl(format!(
                "invalid scheme: {}",
                other
            )))
        }
    }

    if !parsed.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    if parsed.query().is_some() {
        return Err(ValidationError::InvalidUrl(
            "query strings are not allowed".to_string(),
        ));
    }

    if parsed.fragment().is_some() {
        return Err(ValidationError::InvalidUrl(
            "fragments are not allowed".to_string(),
        ));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
