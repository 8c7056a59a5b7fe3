//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::{PaperRecord, SearchQuery, SourceType};
use crate::sources::{Source, SourceError};

/// A mock source that returns predefined papers or a predefined failure.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    name: String,
    papers: Vec<PaperRecord>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock source with the given id that returns no papers.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Mock {}", id),
            id,
            papers: Vec::new(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the papers every search returns.
    pub fn papers(mut self, papers: Vec<PaperRecord>) -> Self {
        self.papers = papers;
        self
    }

    /// Make every search fail with a network error.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Number of times `search` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(SourceError::Network(reason.clone()));
        }

        Ok(self
            .papers
            .iter()
            .take(query.max_results)
            .cloned()
            .collect())
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(id: &str, title: &str, source_type: SourceType) -> PaperRecord {
    match source_type {
        SourceType::PubMed => PaperRecord::pubmed(id, "Mock Journal").title(title),
        SourceType::ArXiv => PaperRecord::arxiv(id).title(title),
    }
}
