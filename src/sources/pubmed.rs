//! PubMed research source implementation using E-utilities API.
//!
//! A search is two calls: `esearch` (JSON) resolves the query to PMIDs, then
//! `efetch` (XML) returns the article records for those PMIDs.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::PubMedConfig;
use crate::models::{PaperRecord, SearchQuery, DEFAULT_ABSTRACT, DEFAULT_JOURNAL, DEFAULT_TITLE, UNKNOWN};
use crate::sources::{Source, SourceError};
use crate::utils::{collect_elements, HttpClient, Selector, XmlNode};

/// Largest page requested from esearch
const MAX_RETMAX: usize = 10_000;

/// Above this many PMIDs efetch is sent as a form POST instead of a GET
const EFETCH_GET_LIMIT: usize = 200;

/// Value of the E-utilities `tool` parameter
const TOOL_NAME: &str = env!("CARGO_PKG_NAME");

/// esearch JSON response; both levels default to empty
#[derive(Debug, Default, Deserialize)]
pub struct ESearchResponse {
    #[serde(default)]
    pub esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct ESearchResult {
    #[serde(default)]
    pub idlist: Vec<String>,
}

/// Fields extracted from one `PubmedArticle` element, before defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubmedArticleRaw {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub pmid: Option<String>,
    pub journal: Option<String>,
}

impl PubmedArticleRaw {
    /// Extract the fields of a `PubmedArticle` subtree
    pub fn from_node(article: &XmlNode) -> Self {
        let text = |path: &str| {
            article
                .find(path)
                .and_then(XmlNode::text)
                .map(str::to_string)
        };

        // Authors need both name parts; anything else (e.g. CollectiveName) is skipped
        let authors = article
            .find_all("Author")
            .filter_map(|author| {
                let last = author.child("LastName").and_then(XmlNode::text)?;
                let fore = author.child("ForeName").and_then(XmlNode::text)?;
                Some(format!("{} {}", fore, last))
            })
            .collect();

        // Only the first PubDate is consulted
        let year = article
            .find("PubDate")
            .and_then(|date| date.child("Year"))
            .and_then(XmlNode::text)
            .map(str::to_string);

        Self {
            title: text("ArticleTitle"),
            abstract_text: text("AbstractText"),
            authors,
            year,
            pmid: text("PMID"),
            journal: text("Journal/Title"),
        }
    }
}

impl From<PubmedArticleRaw> for PaperRecord {
    fn from(raw: PubmedArticleRaw) -> Self {
        PaperRecord::pubmed(
            raw.pmid.unwrap_or_else(|| UNKNOWN.to_string()),
            raw.journal.unwrap_or_else(|| DEFAULT_JOURNAL.to_string()),
        )
        .title(raw.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()))
        .abstract_text(raw.abstract_text.unwrap_or_else(|| DEFAULT_ABSTRACT.to_string()))
        .authors(raw.authors)
        .year(raw.year.unwrap_or_else(|| UNKNOWN.to_string()))
    }
}

/// PubMed research source
///
/// Uses NCBI E-utilities API for searching and fetching PubMed records.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    config: PubMedConfig,
}

impl PubMedSource {
    /// Create a new PubMed source against the public endpoints
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client and default endpoints
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self::from_config(PubMedConfig::default(), client)
    }

    /// Create with explicit endpoints and credentials
    pub fn from_config(config: PubMedConfig, client: Arc<HttpClient>) -> Self {
        Self { client, config }
    }

    /// `tool`, `email` and `api_key` parameters sent with every request
    fn etiquette_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(email) = &self.config.email {
            params.push(("tool", TOOL_NAME.to_string()));
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Query parameters for esearch
    fn search_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.query.clone()),
            ("retmax", query.max_results.min(MAX_RETMAX).to_string()),
            ("retmode", "json".to_string()),
        ];
        params.extend(self.etiquette_params());
        params
    }

    /// Query parameters for efetch
    fn fetch_params(&self, ids: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.etiquette_params());
        params
    }

    /// Parse the esearch JSON body into PMIDs
    fn parse_search_response(json: &str) -> Result<Vec<String>, SourceError> {
        let response: ESearchResponse = serde_json::from_str(json)?;
        Ok(response.esearchresult.idlist)
    }

    /// Parse the efetch XML body, skipping articles that cannot be decoded
    fn parse_fetch_response(xml: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let articles = collect_elements(xml, &Selector::descendants("PubmedArticle"))?;

        let papers = articles
            .into_iter()
            .filter_map(|article| match article {
                Ok(node) => Some(PaperRecord::from(PubmedArticleRaw::from_node(&node))),
                Err(e) => {
                    tracing::debug!("Skipping PubMed article: {}", e);
                    None
                }
            })
            .collect();

        Ok(papers)
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>, SourceError> {
        let json = self
            .client
            .get_text(&self.config.esearch_url, &self.search_params(query))
            .await?;

        let ids = Self::parse_search_response(&json)?;

        if ids.is_empty() {
            tracing::debug!("PubMed returned no ids for '{}'", query.query);
            return Ok(Vec::new());
        }

        let params = self.fetch_params(&ids);
        let xml = if ids.len() > EFETCH_GET_LIMIT {
            self.client
                .post_form_text(&self.config.efetch_url, &params)
                .await?
        } else {
            self.client.get_text(&self.config.efetch_url, &params).await?
        };

        let papers = Self::parse_fetch_response(&xml)?;
        tracing::debug!("PubMed: {} ids, {} articles parsed", ids.len(), papers.len());

        Ok(papers)
    }
}
