//! Core data models for normalized papers and search operations.

mod paper;
mod search;

pub use paper::{
    arxiv_url, pubmed_url, PaperRecord, SourceIds, SourceType, DEFAULT_ABSTRACT, DEFAULT_JOURNAL,
    DEFAULT_TITLE, UNKNOWN,
};
pub use search::{SearchQuery, SearchResults, DEFAULT_MAX_RESULTS};
