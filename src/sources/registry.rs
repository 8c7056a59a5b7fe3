//! Registry for managing bibliographic sources.

use std::sync::Arc;

use super::{arxiv::ArxivSource, pubmed::PubMedSource, Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

/// Ordered set of sources a search fans out to
///
/// Registration order is preserved; it is the order sources are listed by
/// the CLI and queried by the aggregator.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a registry with every built-in source against its public endpoint
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a registry with the built-in sources the configuration enables.
    ///
    /// All sources share one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        let mut registry = Self::empty();

        if config.sources.is_enabled("pubmed") {
            registry.register(Arc::new(PubMedSource::from_config(
                config.sources.pubmed.clone(),
                Arc::clone(&client),
            )));
        }
        if config.sources.is_enabled("arxiv") {
            registry.register(Arc::new(ArxivSource::from_config(
                config.sources.arxiv.clone(),
                Arc::clone(&client),
            )));
        }

        if registry.is_empty() {
            tracing::warn!("All sources are disabled by configuration");
        }

        Ok(registry)
    }

    /// Create a registry with no sources
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a source, replacing any source with the same id in place
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter_mut().find(|s| s.id() == source.id()) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get a source by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::NotFound(format!("Source '{}' not found", id)))
    }

    /// Get all registered sources in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// A registry holding only the named source
    pub fn select(&self, id: &str) -> Result<Self, SourceError> {
        let source = self.get_required(id)?;
        Ok(Self {
            sources: vec![Arc::clone(source)],
        })
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    fn test_registry_basic() {
        let registry = SourceRegistry::new().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["pubmed", "arxiv"]);
    }

    #[test]
    fn test_get_source() {
        let registry = SourceRegistry::new().unwrap();

        let arxiv = registry.get("arxiv");
        assert!(arxiv.is_some());
        assert_eq!(arxiv.unwrap().name(), "ArXiv");

        assert!(registry.get("nonexistent").is_none());
        assert!(matches!(
            registry.get_required("nonexistent"),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_from_config_respects_selection() {
        let mut config = Config::default();
        config.sources.disabled = Some("pubmed".to_string());

        let registry = SourceRegistry::from_config(&config).unwrap();
        assert!(!registry.has("pubmed"));
        assert!(registry.has("arxiv"));

        config.sources.disabled = Some("pubmed,arxiv".to_string());
        assert!(SourceRegistry::from_config(&config).unwrap().is_empty());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = SourceRegistry::empty();
        registry.register(Arc::new(MockSource::new("pubmed")));
        registry.register(Arc::new(MockSource::new("arxiv")));
        registry.register(Arc::new(MockSource::new("pubmed").with_name("Replacement")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["pubmed", "arxiv"]);
        assert_eq!(registry.get("pubmed").unwrap().name(), "Replacement");
    }

    #[test]
    fn test_select() {
        let registry = SourceRegistry::new().unwrap();
        let only = registry.select("pubmed").unwrap();
        assert_eq!(only.ids().collect::<Vec<_>>(), ["pubmed"]);
        assert!(registry.select("scholar").is_err());
    }
}
