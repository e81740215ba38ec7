//! Utility modules supporting the bibliography fetch.
//!
//! - [`HttpClient`]: shared reqwest client with the resolver identity
//! - [`RetryConfig`] and [`with_retry_detailed`]: bounded rate-limit retry with linear backoff
//! - [`Pacer`]: injectable delays ([`TokioPacer`] for real runs, [`RecordingPacer`] for tests)
//! - [`partition`]: order-preserving batch split
//! - [`validate_doi`]: DOI shape check used by `pubfetch check`
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use pubfetch::sources::SourceError;
//! use pubfetch::utils::{with_retry_detailed, RetryConfig, RetryResult, TokioPacer};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() {
//! let config = RetryConfig::default().max_retries(3);
//! match with_retry_detailed(&config, &TokioPacer, "10.1/x", fetch_data).await {
//!     RetryResult::Success(data) => println!("{}", data),
//!     RetryResult::Exhausted(err, attempts) => eprintln!("gave up after {}: {}", attempts, err),
//!     RetryResult::PermanentFailure(err) => eprintln!("{}", err),
//! }
//! # }
//! ```

mod batch;
mod http;
mod pacing;
mod retry;
mod validate;

pub use batch::{batch_count, partition};
pub use http::{has_contact, HttpClient, DEFAULT_USER_AGENT};
pub use pacing::{Pacer, PauseKind, RecordingPacer, TokioPacer};
pub use retry::{with_retry_detailed, RetryConfig, RetryResult};
pub use validate::{validate_doi, validate_resolver_base, ValidationError};
