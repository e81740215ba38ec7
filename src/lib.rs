//! # pubfetch
//!
//! Fetches CSL-JSON citation records for a personal website's publication
//! list at build time.
//!
//! ## Architecture
//!
//! - [`models`]: DOIs, the DOI list, and opaque citation records
//! - [`sources`]: the [`CitationSource`] trait, the DOI resolver client and a mock
//! - [`fetcher`]: batching, pacing and rate-limit retry over a source
//! - [`utils`]: HTTP client, retry policy, pacing clock, batching, validation
//! - [`config`]: configuration management
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pubfetch::{BibliographyFetcher, DoiList, FetchOptions};
//! use pubfetch::sources::DoiOrgSource;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dois = DoiList::from_strs(["10.1038/nature14539"])?;
//! let fetcher = BibliographyFetcher::new(Arc::new(DoiOrgSource::new()?), FetchOptions::default());
//! let records = fetcher.fetch_list(&dois).await?;
//! println!("{}", serde_json::to_string_pretty(&records)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod fetcher;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use fetcher::{BibliographyFetcher, FetchError, FetchOptions};
pub use models::{CitationRecord, Doi, DoiList};
pub use sources::{CitationSource, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
