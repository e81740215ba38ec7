//! Injectable delays.
//!
//! Every wait the fetcher performs goes through a [`Pacer`], so tests can
//! observe delays without sleeping.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Why the fetcher is waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseKind {
    /// Backoff after a rate-limit response
    Retry,
    /// Spacing after each successful fetch
    Request,
    /// Spacing between two batches
    Batch,
}

/// Something that can suspend the current task for a while
#[async_trait]
pub trait Pacer: Send + Sync + std::fmt::Debug {
    async fn pause(&self, kind: PauseKind, delay: Duration);
}

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::trace!("Pausing {:?} for {:?}", kind, delay);
        tokio::time::sleep(delay).await;
    }
}

/// Pacer that records every requested pause and returns immediately
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(PauseKind, Duration)>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pauses in the order they were requested
    pub fn pauses(&self) -> Vec<(PauseKind, Duration)> {
        self.pauses
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Delays of one kind, in order
    pub fn delays_of(&self, kind: PauseKind) -> Vec<Duration> {
        self.pauses()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, d)| d)
            .collect()
    }

    /// Sum of all recorded delays
    pub fn total(&self) -> Duration {
        self.pauses().into_iter().map(|(_, d)| d).sum()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, kind: PauseKind, delay: Duration) {
        if let Ok(mut guard) = self.pauses.lock() {
            guard.push((kind, delay));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_pacer() {
        let pacer = RecordingPacer::new();
        pacer.pause(PauseKind::Request, Duration::from_secs(1)).await;
        pacer.pause(PauseKind::Batch, Duration::from_secs(2)).await;
        pacer.pause(PauseKind::Request, Duration::from_secs(1)).await;

        assert_eq!(pacer.pauses().len(), 3);
        assert_eq!(
            pacer.delays_of(PauseKind::Request),
            vec![Duration::from_secs(1), Duration::from_secs(1)]
        );
        assert_eq!(pacer.total(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_tokio_pacer_waits() {
        let start = std::time::Instant::now();
        TokioPacer
            .pause(PauseKind::Batch, Duration::from_millis(20))
            .await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_tokio_pacer_zero_delay() {
        let start = std::time::Instant::now();
        TokioPacer.pause(PauseKind::Request, Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
