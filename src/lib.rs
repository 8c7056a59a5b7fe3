//! # litscout
//!
//! Searches PubMed and arXiv for a free-text query, merges the results per
//! source, and turns a selection of papers into a Markdown research report
//! with a citation list.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (PaperRecord, SearchQuery, SearchResults)
//! - [`sources`]: The PubMed and arXiv adapters behind the [`Source`] trait
//! - [`aggregator`]: Concurrent fan-out of one query to every source
//! - [`report`]: Report text, citation extraction and citation styles
//! - [`refine`]: Rule-based query refinement
//! - [`server`]: JSON HTTP API
//! - [`utils`]: HTTP client and XML tree helpers
//! - [`config`]: Configuration management

pub mod aggregator;
pub mod config;
pub mod models;
pub mod refine;
pub mod report;
pub mod server;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use models::{PaperRecord, SearchResults};
pub use sources::{Source, SourceRegistry};
