//! arXiv research source implementation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ArxivConfig;
use crate::models::{PaperRecord, SearchQuery, DEFAULT_ABSTRACT, DEFAULT_TITLE, UNKNOWN};
use crate::sources::{Source, SourceError};
use crate::utils::{collect_elements, HttpClient, Selector, XmlNode};

/// Atom namespace used by the arXiv API feed
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Largest page the arXiv API serves in one response
const MAX_PAGE: usize = 2_000;

/// Fields extracted from one Atom `entry`, before defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntryRaw {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub id: Option<String>,
    pub categories: Vec<String>,
}

impl AtomEntryRaw {
    /// Extract the fields of an Atom `entry` subtree.
    ///
    /// Only Atom-namespace children count, so `arxiv:primary_category` is not
    /// read as a category.
    pub fn from_node(entry: &XmlNode) -> Self {
        let text = |name: &str| {
            entry
                .child_ns(ATOM_NS, name)
                .and_then(XmlNode::text)
                .map(str::to_string)
        };

        let authors = entry
            .children_ns(ATOM_NS, "author")
            .filter_map(|author| author.child_ns(ATOM_NS, "name"))
            .filter_map(XmlNode::text)
            .map(str::to_string)
            .collect();

        let categories = entry
            .children_ns(ATOM_NS, "category")
            .filter_map(|category| category.attr("term"))
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            title: text("title"),
            summary: text("summary"),
            authors,
            published: text("published"),
            id: text("id"),
            categories,
        }
    }
}

impl From<AtomEntryRaw> for PaperRecord {
    fn from(raw: AtomEntryRaw) -> Self {
        // "http://arxiv.org/abs/2301.12345v1" -> "2301.12345v1"
        let arxiv_id = raw
            .id
            .as_deref()
            .and_then(|id| id.rsplit('/').next())
            .unwrap_or(UNKNOWN);

        let year = raw
            .published
            .map(|published| published.chars().take(4).collect::<String>())
            .unwrap_or_else(|| UNKNOWN.to_string());

        PaperRecord::arxiv(arxiv_id)
            .title(
                raw.title
                    .as_deref()
                    .map_or(DEFAULT_TITLE, str::trim)
                    .to_string(),
            )
            .abstract_text(
                raw.summary
                    .as_deref()
                    .map_or(DEFAULT_ABSTRACT, str::trim)
                    .to_string(),
            )
            .authors(raw.authors)
            .year(year)
            .categories(raw.categories)
    }
}

/// arXiv research source
///
/// Queries the public Atom API; results are ordered by relevance.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    config: ArxivConfig,
}

impl ArxivSource {
    /// Create a new arXiv source against the public endpoint
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client and the default endpoint
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self::from_config(ArxivConfig::default(), client)
    }

    /// Create with an explicit endpoint
    pub fn from_config(config: ArxivConfig, client: Arc<HttpClient>) -> Self {
        Self { client, config }
    }

    /// Query parameters for the arXiv API
    fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", format!("all:{}", query.query)),
            ("start", "0".to_string()),
            ("max_results", query.max_results.min(MAX_PAGE).to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ]
    }

    /// Parse an Atom feed, skipping entries that cannot be decoded
    fn parse_feed(xml: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let entries = collect_elements(xml, &Selector::children("entry").in_namespace(ATOM_NS))?;

        let papers = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(node) => Some(PaperRecord::from(AtomEntryRaw::from_node(&node))),
                Err(e) => {
                    tracing::debug!("Skipping arXiv entry: {}", e);
                    None
                }
            })
            .collect();

        Ok(papers)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "ArXiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperRecord>, SourceError> {
        let xml = self
            .client
            .get_text(&self.config.query_url, &Self::search_params(query))
            .await?;

        let papers = Self::parse_feed(&xml)?;
        tracing::debug!("arXiv: {} entries parsed", papers.len());

        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:diabetes</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2301.12345v2</id>
    <published>2023-01-15T10:00:00Z</published>
    <title>
      Deep Learning for
      Glucose Prediction
    </title>
    <summary>  Test abstract.
    </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name><arxiv:affiliation>Manchester</arxiv:affiliation></author>
    <author><arxiv:affiliation>Nowhere</arxiv:affiliation></author>
    <arxiv:primary_category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="q-bio.QM" scheme="http://arxiv.org/schemas/atom"/>
    <category scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-th/9901001v1</id>
  </entry>
</feed>"#;

    fn source_for(server: &mockito::ServerGuard) -> ArxivSource {
        let config = ArxivConfig {
            query_url: format!("{}/api/query", server.url()),
        };
        ArxivSource::from_config(config, Arc::new(HttpClient::new().unwrap()))
    }

    #[test]
    fn test_search_params() {
        let params = ArxivSource::search_params(&SearchQuery::new("neural networks"));

        assert!(params.contains(&("search_query", "all:neural networks".to_string())));
        assert!(params.contains(&("start", "0".to_string())));
        assert!(params.contains(&("max_results", "20".to_string())));
        assert!(params.contains(&("sortBy", "relevance".to_string())));
        assert!(params.contains(&("sortOrder", "descending".to_string())));

        let params = ArxivSource::search_params(&SearchQuery::new("x").max_results(50_000));
        assert!(params.contains(&("max_results", "2000".to_string())));

        // zero is passed through; the API then returns no entries
        let params = ArxivSource::search_params(&SearchQuery::new("x").max_results(0));
        assert!(params.contains(&("max_results", "0".to_string())));
    }

    #[test]
    fn test_parse_feed() {
        let papers = ArxivSource::parse_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.arxiv_id(), Some("2301.12345v2"));
        assert!(first.title.starts_with("Deep Learning for"));
        assert!(first.title.ends_with("Glucose Prediction"));
        assert_eq!(first.r#abstract, "Test abstract.");
        assert_eq!(first.authors, ["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.year, "2023");
        assert_eq!(first.category_list(), ["cs.LG".to_string(), "q-bio.QM".to_string()]);
        assert_eq!(first.url, "https://arxiv.org/abs/2301.12345v2");

        let second = &papers[1];
        assert_eq!(second.arxiv_id(), Some("9901001v1"));
        assert_eq!(second.title, "No title");
        assert_eq!(second.r#abstract, "No abstract available");
        assert_eq!(second.year, "Unknown");
        assert!(second.category_list().is_empty());
    }

    #[test]
    fn test_empty_elements_get_defaults() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
              <id>http://arxiv.org/abs/2402.00001v1</id>
              <title/>
              <summary></summary>
              <published/>
              <author><name/></author>
              <author><name>Grace Hopper</name></author>
              <category term=""/>
            </entry>
        </feed>"#;
        let papers = ArxivSource::parse_feed(xml).unwrap();
        assert_eq!(papers.len(), 1);

        let paper = &papers[0];
        assert_eq!(paper.title, "No title");
        assert_eq!(paper.r#abstract, "No abstract available");
        assert_eq!(paper.year, "Unknown");
        assert_eq!(paper.authors, ["Grace Hopper"]);
        assert!(paper.category_list().is_empty());
    }

    #[test]
    fn test_missing_id_defaults() {
        let paper = PaperRecord::from(AtomEntryRaw::default());
        assert_eq!(paper.arxiv_id(), Some("Unknown"));
        assert_eq!(paper.url, "https://arxiv.org/abs/Unknown");
    }

    #[test]
    fn test_entries_outside_atom_namespace_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:o="urn:other">
            <o:entry><id>x</id></o:entry>
            <entry><id>http://arxiv.org/abs/1</id></entry>
        </feed>"#;
        let papers = ArxivSource::parse_feed(xml).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].arxiv_id(), Some("1"));
    }

    #[test]
    fn test_undecodable_entry_skipped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><id>http://arxiv.org/abs/1</id><title>&nope;</title></entry>
            <entry><id>http://arxiv.org/abs/2</id></entry>
        </feed>"#;
        let papers = ArxivSource::parse_feed(xml).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].arxiv_id(), Some("2"));
    }

    #[test]
    fn test_malformed_feed_is_error() {
        let result = ArxivSource::parse_feed("<feed><entry></feed>");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "all:diabetes".into()),
                Matcher::UrlEncoded("max_results".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .expect(1)
            .create_async()
            .await;

        let papers = source_for(&server)
            .search(&SearchQuery::new("diabetes").max_results(5))
            .await
            .unwrap();

        assert_eq!(papers.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_source_error() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let result = source_for(&server).search(&SearchQuery::new("x")).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
