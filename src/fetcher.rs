//! The bibliography fetcher.
//!
//! [`BibliographyFetcher::fetch_all`] resolves an ordered DOI list into an
//! ordered list of citation records. Requests never overlap: DOIs are
//! fetched one at a time, in batches, with pauses after every fetch and
//! between batches. A rate-limited DOI is retried with linear backoff; any
//! other failure, or a spent retry budget, aborts the whole run.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{CitationRecord, Doi, DoiList};
use crate::sources::{CitationSource, SourceError};
use crate::utils::{
    batch_count, partition, with_retry_detailed, Pacer, PauseKind, RetryConfig, RetryResult,
    TokioPacer,
};

/// Batching, pacing and retry knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// DOIs per batch
    pub batch_size: usize,
    /// Pause after each successful fetch
    pub request_delay: Duration,
    /// Pause between two batches
    pub batch_delay: Duration,
    /// Rate-limit retry policy
    pub retry: RetryConfig,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: 3,
            request_delay: Duration::from_secs(1),
            batch_delay: Duration::from_secs(2),
            retry: RetryConfig::default(),
        }
    }
}

/// Errors that abort a fetch
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Still rate limited once the retry budget was spent
    #[error("Rate limited on {doi} after {attempts} attempts")]
    RetriesExhausted { doi: Doi, attempts: u32 },

    /// Any failure that is never retried
    #[error("Failed to fetch {doi}: {source}")]
    Source { doi: Doi, source: SourceError },
}

impl FetchError {
    /// The DOI whose fetch failed
    pub fn doi(&self) -> &Doi {
        match self {
            FetchError::RetriesExhausted { doi, .. } => doi,
            FetchError::Source { doi, .. } => doi,
        }
    }
}

/// Sequential, rate-limit aware citation fetcher
#[derive(Debug, Clone)]
pub struct BibliographyFetcher {
    source: Arc<dyn CitationSource>,
    pacer: Arc<dyn Pacer>,
    options: FetchOptions,
}

impl BibliographyFetcher {
    /// Fetcher that waits on the tokio timer
    pub fn new(source: Arc<dyn CitationSource>, options: FetchOptions) -> Self {
        Self::with_pacer(source, Arc::new(TokioPacer), options)
    }

    /// Fetcher with an injected pacer
    pub fn with_pacer(
        source: Arc<dyn CitationSource>,
        pacer: Arc<dyn Pacer>,
        options: FetchOptions,
    ) -> Self {
        Self {
            source,
            pacer,
            options,
        }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch one DOI, retrying while the resolver answers 429.
    pub async fn fetch_one(&self, doi: &Doi) -> Result<CitationRecord, FetchError> {
        let source = &self.source;
        let result = with_retry_detailed(
            &self.options.retry,
            self.pacer.as_ref(),
            doi.as_str(),
            move || source.fetch_citation(doi),
        )
        .await;

        match result {
            RetryResult::Success(record) => Ok(record),
            RetryResult::Exhausted(error, attempts) => {
                tracing::error!("Failed to fetch {}: {} ({} attempts)", doi, error, attempts);
                Err(FetchError::RetriesExhausted {
                    doi: doi.clone(),
                    attempts,
                })
            }
            RetryResult::PermanentFailure(error) => {
                tracing::error!("Failed to fetch {}: {}", doi, error);
                Err(FetchError::Source {
                    doi: doi.clone(),
                    source: error,
                })
            }
        }
    }

    /// Fetch every DOI in order.
    ///
    /// Returns one record per DOI in input order, or the first error.
    pub async fn fetch_all(&self, dois: &[Doi]) -> Result<Vec<CitationRecord>, FetchError> {
        let result = self.fetch_batches(dois).await;
        if let Err(e) = &result {
            tracing::error!("Error fetching publications: {}", e);
        }
        result
    }

    /// [`Self::fetch_all`] over a loaded list
    pub async fn fetch_list(&self, list: &DoiList) -> Result<Vec<CitationRecord>, FetchError> {
        self.fetch_all(list.as_slice()).await
    }

    async fn fetch_batches(&self, dois: &[Doi]) -> Result<Vec<CitationRecord>, FetchError> {
        let batches = partition(dois, self.options.batch_size);
        let total = batch_count(dois.len(), self.options.batch_size);
        let mut records = Vec::with_capacity(dois.len());

        for (i, batch) in batches.into_iter().enumerate() {
            tracing::info!("Fetching batch {} of {}...", i + 1, total);

            for doi in batch {
                let record = self.fetch_one(doi).await?;
                records.push(record);
                self.pacer
                    .pause(PauseKind::Request, self.options.request_delay)
                    .await;
            }

            if i + 1 < total {
                self.pacer
                    .pause(PauseKind::Batch, self.options.batch_delay)
                    .await;
            }
        }

        tracing::debug!("Fetched {} citation records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_record, MockResponse};
    use crate::sources::MockSource;
    use crate::utils::RecordingPacer;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn dois(raw: &[&str]) -> Vec<Doi> {
        raw.iter().map(|d| Doi::new(d).unwrap()).collect()
    }

    fn fast_options() -> FetchOptions {
        FetchOptions {
            retry: RetryConfig::default().backoff_step(Duration::from_millis(5)),
            ..FetchOptions::default()
        }
    }

    fn fetcher(source: &Arc<MockSource>, pacer: &Arc<RecordingPacer>) -> BibliographyFetcher {
        BibliographyFetcher::with_pacer(source.clone(), pacer.clone(), fast_options())
    }

    /// Source and pacer writing to one log, to check interleaving
    #[derive(Debug, Default)]
    struct Timeline {
        events: Mutex<Vec<String>>,
    }

    impl Timeline {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CitationSource for Timeline {
        fn id(&self) -> &str {
            "timeline"
        }

        fn name(&self) -> &str {
            "Timeline"
        }

        async fn fetch_citation(&self, doi: &Doi) -> Result<CitationRecord, SourceError> {
            self.events.lock().unwrap().push(format!("fetch {}", doi));
            Ok(make_record(doi.as_str(), doi.as_str()))
        }
    }

    #[async_trait]
    impl Pacer for Timeline {
        async fn pause(&self, kind: PauseKind, _delay: Duration) {
            self.events.lock().unwrap().push(format!("{:?}", kind));
        }
    }

    #[tokio::test]
    async fn test_fetch_all_batches_in_order() {
        let timeline = Arc::new(Timeline::default());
        let fetcher =
            BibliographyFetcher::with_pacer(timeline.clone(), timeline.clone(), fast_options());

        let input = dois(&["10.1/a", "10.1/b", "10.1/c", "10.1/d"]);
        let records = fetcher.fetch_all(&input).await.unwrap();

        let titles: Vec<&str> = records.iter().filter_map(|r| r.str_field("title")).collect();
        assert_eq!(titles, vec!["10.1/a", "10.1/b", "10.1/c", "10.1/d"]);

        assert_eq!(
            timeline.events(),
            vec![
                "fetch 10.1/a",
                "Request",
                "fetch 10.1/b",
                "Request",
                "fetch 10.1/c",
                "Request",
                "Batch",
                "fetch 10.1/d",
                "Request",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_delays() {
        let source = Arc::new(
            MockSource::new()
                .with_record("10.1/a", make_record("10.1/a", "A"))
                .with_record("10.1/b", make_record("10.1/b", "B"))
                .with_record("10.1/c", make_record("10.1/c", "C"))
                .with_record("10.1/d", make_record("10.1/d", "D")),
        );
        let pacer = Arc::new(RecordingPacer::new());

        let input = dois(&["10.1/a", "10.1/b", "10.1/c", "10.1/d"]);
        fetcher(&source, &pacer).fetch_all(&input).await.unwrap();

        assert_eq!(pacer.delays_of(PauseKind::Request), vec![Duration::from_secs(1); 4]);
        assert_eq!(pacer.delays_of(PauseKind::Batch), vec![Duration::from_secs(2)]);
        assert!(pacer.delays_of(PauseKind::Retry).is_empty());
        assert_eq!(source.calls(), vec!["10.1/a", "10.1/b", "10.1/c", "10.1/d"]);
    }

    #[tokio::test]
    async fn test_no_batch_delay_for_single_batch() {
        let source = Arc::new(
            MockSource::new()
                .with_record("10.1/a", make_record("10.1/a", "A"))
                .with_record("10.1/b", make_record("10.1/b", "B")),
        );
        let pacer = Arc::new(RecordingPacer::new());

        let records = fetcher(&source, &pacer)
            .fetch_all(&dois(&["10.1/a", "10.1/b"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(pacer.delays_of(PauseKind::Batch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let source = Arc::new(MockSource::new());
        let pacer = Arc::new(RecordingPacer::new());

        let records = fetcher(&source, &pacer).fetch_all(&[]).await.unwrap();

        assert!(records.is_empty());
        assert!(source.calls().is_empty());
        assert!(pacer.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_retries_rate_limit() {
        let record = make_record("10.1/x", "X");
        let source = Arc::new(MockSource::new().with_sequence(
            "10.1/x",
            vec![MockResponse::RateLimited, MockResponse::RateLimited],
            MockResponse::Record(record.clone()),
        ));
        let pacer = Arc::new(RecordingPacer::new());

        let doi = Doi::new("10.1/x").unwrap();
        let fetched = fetcher(&source, &pacer).fetch_one(&doi).await.unwrap();

        assert_eq!(fetched, record);
        assert_eq!(source.calls_for("10.1/x"), 3);

        let retries = pacer.delays_of(PauseKind::Retry);
        assert_eq!(retries.len(), 2);
        assert!(retries.windows(2).all(|w| w[0] <= w[1]));
        assert!(retries[0] < retries[1]);
    }

    #[tokio::test]
    async fn test_fetch_one_exhausts_budget() {
        let source = Arc::new(MockSource::new().with_sequence(
            "10.1/x",
            vec![],
            MockResponse::RateLimited,
        ));
        let pacer = Arc::new(RecordingPacer::new());

        let doi = Doi::new("10.1/x").unwrap();
        let err = fetcher(&source, &pacer).fetch_one(&doi).await.unwrap_err();

        match err {
            FetchError::RetriesExhausted { doi, attempts } => {
                assert_eq!(doi.as_str(), "10.1/x");
                assert_eq!(attempts, 6);
            }
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(source.calls_for("10.1/x"), 6);
        assert_eq!(pacer.delays_of(PauseKind::Retry).len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_all_aborts_on_error() {
        let source = Arc::new(
            MockSource::new()
                .with_record("10.1/a", make_record("10.1/a", "A"))
                .with_record("10.1/c", make_record("10.1/c", "C"))
                .with_sequence("10.1/b", vec![], MockResponse::Status(500)),
        );
        let pacer = Arc::new(RecordingPacer::new());

        let err = fetcher(&source, &pacer)
            .fetch_all(&dois(&["10.1/a", "10.1/b", "10.1/c"]))
            .await
            .unwrap_err();

        assert_eq!(err.doi().as_str(), "10.1/b");
        assert!(matches!(
            err,
            FetchError::Source {
                source: SourceError::Status(500),
                ..
            }
        ));
        assert_eq!(source.calls(), vec!["10.1/a", "10.1/b"]);
        assert!(pacer.delays_of(PauseKind::Retry).is_empty());
    }

    #[tokio::test]
    async fn test_network_error_not_retried() {
        let source = Arc::new(MockSource::new().with_sequence(
            "10.1/a",
            vec![],
            MockResponse::Network("connection reset".to_string()),
        ));
        let pacer = Arc::new(RecordingPacer::new());

        let result = fetcher(&source, &pacer)
            .fetch_all(&dois(&["10.1/a"]))
            .await;

        assert!(result.is_err());
        assert_eq!(source.calls_for("10.1/a"), 1);
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let source = Arc::new(
            MockSource::new().with_record("10.1/a", make_record("10.1/a", "Stable")),
        );
        let pacer = Arc::new(RecordingPacer::new());
        let fetcher = fetcher(&source, &pacer);
        let doi = Doi::new("10.1/a").unwrap();

        let first = fetcher.fetch_one(&doi).await.unwrap();
        let second = fetcher.fetch_one(&doi).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_list() {
        let source = Arc::new(
            MockSource::new()
                .with_record("10.1/a", make_record("10.1/a", "A"))
                .with_record("10.1/b", make_record("10.1/b", "B")),
        );
        let pacer = Arc::new(RecordingPacer::new());
        let list = DoiList::from_strs(["10.1/b", "10.1/a"]).unwrap();

        let records = fetcher(&source, &pacer).fetch_list(&list).await.unwrap();
        let titles: Vec<&str> = records.iter().filter_map(|r| r.str_field("title")).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }
}
