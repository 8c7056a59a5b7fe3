//! Search request and response models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::PaperRecord;

/// Page size requested from each source when the caller does not choose one
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Maximum number of results to return per source
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// Merged results of one search across every registered source
///
/// Serializes as `{"pubmed": [...], "arxiv": [...], "total_count": n}`, with
/// an `errors` object added only when some source failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Papers per source id, one list for every source that was queried
    #[serde(flatten)]
    pub results: BTreeMap<String, Vec<PaperRecord>>,

    /// Sum of all list lengths
    pub total_count: usize,

    /// Failure reason per source id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl SearchResults {
    /// Record the papers a source returned
    pub fn insert(&mut self, source_id: impl Into<String>, papers: Vec<PaperRecord>) {
        self.total_count += papers.len();
        if let Some(previous) = self.results.insert(source_id.into(), papers) {
            self.total_count -= previous.len();
        }
    }

    /// Record that a source failed; its list is present but empty
    pub fn insert_failure(&mut self, source_id: impl Into<String>, reason: impl Into<String>) {
        let source_id = source_id.into();
        self.insert(source_id.clone(), Vec::new());
        self.errors.insert(source_id, reason.into());
    }

    /// Papers returned by one source (empty if it was not queried)
    pub fn papers(&self, source_id: &str) -> &[PaperRecord] {
        self.results
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All papers, grouped by source id in key order
    pub fn all_papers(&self) -> impl Iterator<Item = &PaperRecord> {
        self.results.values().flatten()
    }

    /// Whether the given source failed during this search
    pub fn failed(&self, source_id: &str) -> bool {
        self.errors.contains_key(source_id)
    }
}
