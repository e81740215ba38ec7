//! Core data models: DOIs, DOI lists and citation records.

mod citation;
mod doi;

pub use citation::CitationRecord;
pub use doi::{Doi, DoiList, DoiListError};
