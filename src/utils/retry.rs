//! Rate-limit retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use crate::sources::SourceError;
use crate::utils::pacing::{Pacer, PauseKind};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Unit of the linear backoff
    pub backoff_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_step: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Delay before the next attempt, given how many retries were already spent.
    ///
    /// Grows linearly: the first retry waits one step, the second two steps.
    pub fn delay_for(&self, retries_consumed: u32) -> Duration {
        self.backoff_step.saturating_mul(retries_consumed.saturating_add(1))
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub enum RetryResult<T> {
    /// Operation succeeded
    Success(T),
    /// Still rate limited after the whole budget; carries the number of attempts
    Exhausted(SourceError, u32),
    /// Failed with an error that is never retried
    PermanentFailure(SourceError),
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget is spent.
///
/// Only [`SourceError::RateLimited`] is retried. Each retry waits
/// [`RetryConfig::delay_for`] through `pacer`. `label` names the work in logs.
pub async fn with_retry_detailed<T, F, Fut, P>(
    config: &RetryConfig,
    pacer: &P,
    label: &str,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
    P: Pacer + ?Sized,
{
    let mut retries_consumed = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if retries_consumed > 0 {
                    tracing::info!(
                        "{} succeeded after {} rate-limited attempts",
                        label,
                        retries_consumed
                    );
                }
                return RetryResult::Success(value);
            }
            Err(error) if error.is_rate_limited() => {
                if retries_consumed >= config.max_retries {
                    return RetryResult::Exhausted(error, retries_consumed + 1);
                }

                let delay = config.delay_for(retries_consumed);
                tracing::warn!(
                    "Rate limited. Retrying {} in {} seconds...",
                    label,
                    delay.as_secs_f64()
                );
                pacer.pause(PauseKind::Retry, delay).await;
                retries_consumed += 1;
            }
            Err(error) => return RetryResult::PermanentFailure(error),
        }
    }
}
