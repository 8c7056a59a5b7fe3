//! Bibliographic source adapters with a shared trait-based interface.
//!
//! This module defines the [`Source`] trait that every upstream adapter
//! implements. The [`SourceRegistry`] holds the ordered set of sources a
//! search fans out to; sources can be switched off at runtime through the
//! `[sources]` configuration section or the environment:
//!
//! ```bash
//! # Only query arXiv
//! export LITSCOUT_SOURCES__ENABLED="arxiv"
//!
//! # Query everything except PubMed
//! export LITSCOUT_SOURCES__DISABLED="pubmed"
//! ```
//!
//! `disabled` always takes precedence over `enabled`.

mod arxiv;
mod pubmed;
mod registry;

pub mod mock;

pub use arxiv::{AtomEntryRaw, ArxivSource, ATOM_NS};
pub use mock::MockSource;
pub use pubmed::{ESearchResponse, ESearchResult, PubMedSource, PubmedArticleRaw};
pub use registry::SourceRegistry;

use crate::models::{PaperRecord, SearchQuery};
use crate::utils::XmlError;
use async_trait::async_trait;

/// The Source trait defines the interface for all bibliographic sources.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Return normalized [`PaperRecord`]s from `search`, applying field
///    defaults instead of rejecting incomplete records
/// 3. Register it with [`SourceRegistry::register`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source; also the key of its result list
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search for papers matching the query.
    ///
    /// Entries that cannot be decoded are skipped; an error means the source
    /// as a whole could not be queried.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Source not registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success response from the source
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<XmlError> for SourceError {
    fn from(err: XmlError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidRequest(format!("bad endpoint URL: {}", err))
    }
}
