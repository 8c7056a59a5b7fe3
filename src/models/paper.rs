//! Paper model representing a normalized record from any source.

use serde::{Deserialize, Serialize};

/// Title used when a source record carries none
pub const DEFAULT_TITLE: &str = "No title";
/// Abstract used when a source record carries none
pub const DEFAULT_ABSTRACT: &str = "No abstract available";
/// Placeholder for an unknown year or identifier
pub const UNKNOWN: &str = "Unknown";
/// Journal used when a PubMed record carries none
pub const DEFAULT_JOURNAL: &str = "Unknown journal";

/// The repository where the paper was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    PubMed,
    ArXiv,
}

impl SourceType {
    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::PubMed => "PubMed",
            SourceType::ArXiv => "ArXiv",
        }
    }

    /// Returns the source identifier used for registry keys and result lists
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::PubMed => "pubmed",
            SourceType::ArXiv => "arxiv",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Source-specific identifiers and metadata.
///
/// A record carries exactly one of these, so a PMID and an arXiv ID can never
/// appear on the same paper. Serialized flat into the enclosing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceIds {
    PubMed {
        pmid: String,
        journal: String,
    },
    ArXiv {
        arxiv_id: String,
        categories: Vec<String>,
    },
}

/// A research paper normalized from one of the upstream sources
///
/// Every field always holds either a real value or its documented default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title
    pub title: String,

    /// Abstract text
    pub r#abstract: String,

    /// Author names in source order
    pub authors: Vec<String>,

    /// Four-digit publication year, or "Unknown"
    pub year: String,

    /// Source where the paper was found
    pub source: SourceType,

    /// Landing page URL derived from the source identifier
    pub url: String,

    #[serde(flatten)]
    pub ids: SourceIds,
}

impl PaperRecord {
    /// Create a PubMed record; the URL is derived from the PMID
    pub fn pubmed(pmid: impl Into<String>, journal: impl Into<String>) -> Self {
        let pmid = pmid.into();
        Self {
            title: DEFAULT_TITLE.to_string(),
            r#abstract: DEFAULT_ABSTRACT.to_string(),
            authors: Vec::new(),
            year: UNKNOWN.to_string(),
            source: SourceType::PubMed,
            url: pubmed_url(&pmid),
            ids: SourceIds::PubMed {
                pmid,
                journal: journal.into(),
            },
        }
    }

    /// Create an arXiv record; the URL is derived from the arXiv ID
    pub fn arxiv(arxiv_id: impl Into<String>) -> Self {
        let arxiv_id = arxiv_id.into();
        Self {
            title: DEFAULT_TITLE.to_string(),
            r#abstract: DEFAULT_ABSTRACT.to_string(),
            authors: Vec::new(),
            year: UNKNOWN.to_string(),
            source: SourceType::ArXiv,
            url: arxiv_url(&arxiv_id),
            ids: SourceIds::ArXiv {
                arxiv_id,
                categories: Vec::new(),
            },
        }
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.r#abstract = abstract_text.into();
        self
    }

    /// Set the authors
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Set the year
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    /// Set the arXiv categories. No-op on PubMed records.
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        if let SourceIds::ArXiv {
            categories: ref mut current,
            ..
        } = self.ids
        {
            *current = categories;
        }
        self
    }

    /// PubMed identifier, if this is a PubMed record
    pub fn pmid(&self) -> Option<&str> {
        match &self.ids {
            SourceIds::PubMed { pmid, .. } => Some(pmid),
            SourceIds::ArXiv { .. } => None,
        }
    }

    /// Journal title, if this is a PubMed record
    pub fn journal(&self) -> Option<&str> {
        match &self.ids {
            SourceIds::PubMed { journal, .. } => Some(journal),
            SourceIds::ArXiv { .. } => None,
        }
    }

    /// arXiv identifier, if this is an arXiv record
    pub fn arxiv_id(&self) -> Option<&str> {
        match &self.ids {
            SourceIds::ArXiv { arxiv_id, .. } => Some(arxiv_id),
            SourceIds::PubMed { .. } => None,
        }
    }

    /// arXiv categories; empty for PubMed records
    pub fn category_list(&self) -> &[String] {
        match &self.ids {
            SourceIds::ArXiv { categories, .. } => categories,
            SourceIds::PubMed { .. } => &[],
        }
    }
}

/// PubMed landing page for a PMID
pub fn pubmed_url(pmid: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)
}

/// arXiv abstract page for an arXiv ID
pub fn arxiv_url(arxiv_id: &str) -> String {
    format!("https://arxiv.org/abs/{}", arxiv_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubmed_record_defaults() {
        let paper = PaperRecord::pubmed("12345", DEFAULT_JOURNAL);

        assert_eq!(paper.title, "No title");
        assert_eq!(paper.r#abstract, "No abstract available");
        assert!(paper.authors.is_empty());
        assert_eq!(paper.year, "Unknown");
        assert_eq!(paper.url, "https://pubmed.ncbi.nlm.nih.gov/12345/");
        assert_eq!(paper.pmid(), Some("12345"));
        assert_eq!(paper.arxiv_id(), None);
    }

    #[test]
    fn test_arxiv_record_builder() {
        let paper = PaperRecord::arxiv("2301.12345v1")
            .title("Attention")
            .authors(vec!["Ada Lovelace".to_string()])
            .categories(vec!["cs.LG".to_string()])
            .year("2023");

        assert_eq!(paper.url, "https://arxiv.org/abs/2301.12345v1");
        assert_eq!(paper.category_list(), ["cs.LG".to_string()]);
        assert_eq!(paper.pmid(), None);
        assert_eq!(paper.journal(), None);
    }

    #[test]
    fn test_categories_ignored_on_pubmed() {
        let paper = PaperRecord::pubmed("1", "J").categories(vec!["x".to_string()]);
        assert!(paper.category_list().is_empty());
    }

    #[test]
    fn test_serializes_flat() {
        let pubmed = serde_json::to_value(PaperRecord::pubmed("42", "Nature")).unwrap();
        assert_eq!(pubmed["pmid"], "42");
        assert_eq!(pubmed["journal"], "Nature");
        assert_eq!(pubmed["source"], "PubMed");
        assert_eq!(pubmed["abstract"], "No abstract available");
        assert!(pubmed.get("arxiv_id").is_none());

        let arxiv = serde_json::to_value(PaperRecord::arxiv("2101.00001")).unwrap();
        assert_eq!(arxiv["arxiv_id"], "2101.00001");
        assert_eq!(arxiv["categories"], serde_json::json!([]));
        assert_eq!(arxiv["source"], "ArXiv");
        assert!(arxiv.get("pmid").is_none());
    }

    #[test]
    fn test_deserializes_back() {
        let paper = PaperRecord::arxiv("2101.00001").title("T");
        let json = serde_json::to_string(&paper).unwrap();
        let back: PaperRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, paper);
    }
}
