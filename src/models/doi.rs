//! DOI identifiers and the ordered DOI list read at build start.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A Digital Object Identifier, treated as an opaque token.
///
/// Only surrounding whitespace is removed. The token is sent to the resolver
/// exactly as given (url-encoded as one path segment), so validation of the
/// `10.xxxx/...` shape is left to [`crate::utils::validate_doi`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    /// Create a DOI from a raw string
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DoiListError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DoiListError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as sent to the resolver
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier encoded as a single URL path segment
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl std::fmt::Display for Doi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Doi {
    type Error = DoiListError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Doi::new(value)
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.0
    }
}

impl std::str::FromStr for Doi {
    type Err = DoiListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Doi::new(s)
    }
}

/// The ordered list of DOIs to fetch, loaded once per run.
///
/// On disk this is a JSON array of strings, e.g. `publication_doi.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoiList(Vec<Doi>);

impl DoiList {
    /// Build a list from raw strings, rejecting empty entries
    pub fn from_strs<I, S>(items: I) -> Result<Self, DoiListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items
            .into_iter()
            .map(Doi::new)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Parse a JSON array of DOI strings
    pub fn from_json(content: &str) -> Result<Self, DoiListError> {
        serde_json::from_str(content).map_err(|e| DoiListError::Parse(e.to_string()))
    }

    /// Load the list from a JSON file
    pub fn load(path: &Path) -> Result<Self, DoiListError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DoiListError::Io(format!("{}: {}", path.display(), e)))?;
        let list = Self::from_json(&content)?;
        tracing::debug!("Loaded {} DOIs from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Doi> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Doi] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a DoiList {
    type Item = &'a Doi;
    type IntoIter = std::slice::Iter<'a, Doi>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors raised while reading DOIs
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DoiListError {
    #[error("DOI list contains an empty identifier")]
    Empty,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
