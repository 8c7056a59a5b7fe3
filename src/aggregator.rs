//! Fan-out search across every registered source.

use futures_util::future::join_all;
use std::sync::Arc;

use crate::models::{SearchQuery, SearchResults, DEFAULT_MAX_RESULTS};
use crate::sources::SourceRegistry;

/// Errors rejected before any source is queried
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Query is required")]
    EmptyQuery,
}

/// Queries all sources of a registry concurrently and merges their results
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    max_results: usize,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Set the per-source page size used by [`Aggregator::search_all`]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Search every source with the configured page size
    pub async fn search_all(&self, query: &str) -> Result<SearchResults, SearchError> {
        self.search_with(&SearchQuery::new(query).max_results(self.max_results))
            .await
    }

    /// Search every source.
    ///
    /// A failing source contributes an empty list and an `errors` entry; it
    /// never fails the whole search.
    pub async fn search_with(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        if query.query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let searches = self.registry.all().map(|source| async move {
            (source.id().to_string(), source.search(query).await)
        });

        let mut results = SearchResults::default();
        for (id, outcome) in join_all(searches).await {
            match outcome {
                Ok(papers) => {
                    tracing::info!("{}: {} papers", id, papers.len());
                    results.insert(id, papers);
                }
                Err(e) => {
                    tracing::warn!("Search failed for {}: {}", id, e);
                    results.insert_failure(id, e.to_string());
                }
            }
        }

        Ok(results)
    }
}
