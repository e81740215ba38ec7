//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::models::{CitationRecord, Doi};
use crate::sources::{CitationSource, SourceError};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum MockResponse {
    Record(CitationRecord),
    RateLimited,
    Status(u16),
    Network(String),
}

impl MockResponse {
    fn into_result(self) -> Result<CitationRecord, SourceError> {
        match self {
            MockResponse::Record(record) => Ok(record),
            MockResponse::RateLimited => Err(SourceError::RateLimited),
            MockResponse::Status(code) => Err(SourceError::Status(code)),
            MockResponse::Network(msg) => Err(SourceError::Network(msg)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    /// Answers consumed one per call, before falling back to `stable`
    queued: VecDeque<MockResponse>,
    /// Answer repeated once the queue is empty
    stable: Option<MockResponse>,
}

/// A mock source that replays scripted responses per DOI and records calls.
///
/// A DOI with no script answers with a 404 status.
#[derive(Debug, Default)]
pub struct MockSource {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `doi` with `record`
    pub fn with_record(self, doi: &str, record: CitationRecord) -> Self {
        self.set_stable(doi, MockResponse::Record(record));
        self
    }

    /// Answer `doi` with `responses` in order, then with `then` forever
    pub fn with_sequence(self, doi: &str, responses: Vec<MockResponse>, then: MockResponse) -> Self {
        if let Ok(mut guard) = self.scripts.lock() {
            let script = guard.entry(doi.to_string()).or_default();
            script.queued.extend(responses);
            script.stable = Some(then);
        }
        self
    }

    /// Replace the stable answer for `doi`
    pub fn set_stable(&self, doi: &str, response: MockResponse) {
        if let Ok(mut guard) = self.scripts.lock() {
            guard.entry(doi.to_string()).or_default().stable = Some(response);
        }
    }

    /// Every DOI requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of requests made for `doi`
    pub fn calls_for(&self, doi: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == doi).count()
    }

    fn next_response(&self, doi: &str) -> MockResponse {
        let Ok(mut guard) = self.scripts.lock() else {
            return MockResponse::Network("mock poisoned".to_string());
        };
        match guard.get_mut(doi) {
            Some(script) => script
                .queued
                .pop_front()
                .or_else(|| script.stable.clone())
                .unwrap_or(MockResponse::Status(404)),
            None => MockResponse::Status(404),
        }
    }
}

#[async_trait]
impl CitationSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn fetch_citation(&self, doi: &Doi) -> Result<CitationRecord, SourceError> {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(doi.as_str().to_string());
        }
        self.next_response(doi.as_str()).into_result()
    }
}

/// Helper to create a minimal CSL-JSON record for testing.
pub fn make_record(doi: &str, title: &str) -> CitationRecord {
    CitationRecord::new(serde_json::json!({
        "DOI": doi,
        "title": title,
        "type": "article-journal",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sequence_then_stable() {
        let record = make_record("10.1/x", "X");
        let source = MockSource::new().with_sequence(
            "10.1/x",
            vec![MockResponse::RateLimited],
            MockResponse::Record(record.clone()),
        );
        let doi = Doi::new("10.1/x").unwrap();

        assert!(matches!(
            source.fetch_citation(&doi).await,
            Err(SourceError::RateLimited)
        ));
        assert_eq!(source.fetch_citation(&doi).await.unwrap(), record);
        assert_eq!(source.fetch_citation(&doi).await.unwrap(), record);
        assert_eq!(source.calls_for("10.1/x"), 3);
    }

    #[tokio::test]
    async fn test_mock_unknown_doi() {
        let source = MockSource::new();
        let doi = Doi::new("10.1/missing").unwrap();
        assert!(matches!(
            source.fetch_citation(&doi).await,
            Err(SourceError::Status(404))
        ));
        assert_eq!(source.calls(), vec!["10.1/missing".to_string()]);
    }
}
