//! Literature report and citation list for a set of selected papers.
//!
//! Everything here is pure formatting over records the caller already has;
//! no source is contacted.

mod cite;

pub use cite::{format_citation, CitationStyle};

use serde::{Deserialize, Serialize};

use crate::models::{PaperRecord, DEFAULT_ABSTRACT, UNKNOWN};

/// Characters of each abstract quoted in the report
pub const ABSTRACT_EXCERPT_CHARS: usize = 300;

/// Authors listed per paper before "et al."
pub const MAX_LISTED_AUTHORS: usize = 3;

/// Title used when a selected paper carries none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Format of [`GeneratedReport::generated_at`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Errors that prevent a report from being generated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("No papers selected for report generation")]
    NoPapers,
}

/// A paper as selected by the user.
///
/// The selection usually round-trips through a client, so every field is
/// optional on input and falls back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPaper {
    #[serde(default = "unknown_title")]
    pub title: String,

    #[serde(default = "default_abstract")]
    pub r#abstract: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default = "unknown")]
    pub year: String,

    #[serde(default = "unknown")]
    pub source: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub journal: String,

    #[serde(default)]
    pub pmid: String,

    #[serde(default)]
    pub arxiv_id: String,
}

fn unknown_title() -> String {
    UNKNOWN_TITLE.to_string()
}

fn default_abstract() -> String {
    DEFAULT_ABSTRACT.to_string()
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl Default for SelectedPaper {
    fn default() -> Self {
        Self {
            title: unknown_title(),
            r#abstract: default_abstract(),
            authors: Vec::new(),
            year: unknown(),
            source: unknown(),
            url: String::new(),
            journal: String::new(),
            pmid: String::new(),
            arxiv_id: String::new(),
        }
    }
}

impl From<&PaperRecord> for SelectedPaper {
    fn from(paper: &PaperRecord) -> Self {
        Self {
            title: paper.title.clone(),
            r#abstract: paper.r#abstract.clone(),
            authors: paper.authors.clone(),
            year: paper.year.clone(),
            source: paper.source.name().to_string(),
            url: paper.url.clone(),
            journal: paper.journal().unwrap_or_default().to_string(),
            pmid: paper.pmid().unwrap_or_default().to_string(),
            arxiv_id: paper.arxiv_id().unwrap_or_default().to_string(),
        }
    }
}

impl From<PaperRecord> for SelectedPaper {
    fn from(paper: PaperRecord) -> Self {
        Self::from(&paper)
    }
}

/// One entry of the citation list, numbered like the report sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    /// 1-based position in the selection
    pub id: usize,
    pub title: String,
    pub authors: Vec<String>,
    pub year: String,
    pub source: String,
    pub url: String,
    pub journal: String,
    pub pmid: String,
    pub arxiv_id: String,
}

/// Report text, citation list and generation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub report: String,
    pub citations: Vec<CitationRecord>,
    pub generated_at: String,
}

/// Render the report for `papers` in selection order.
///
/// The output depends only on the inputs.
pub fn generate_report(papers: &[SelectedPaper], query: &str) -> Result<String, ReportError> {
    if papers.is_empty() {
        return Err(ReportError::NoPapers);
    }

    let count = papers.len();
    let mut report = format!(
        "# Research Report: {query}

## Executive Summary

This report analyzes {count} selected papers related to \"{query}\". The research spans multiple sources including PubMed and ArXiv, providing a comprehensive overview of current literature in this field.

## Literature Overview

The selected papers cover various aspects of {query}:

"
    );

    for (i, paper) in papers.iter().enumerate() {
        // Markdown line breaks: two trailing spaces
        report.push_str(&format!(
            "### [{index}] {title}\n\n\
             **Authors:** {authors}  \n\
             **Year:** {year}  \n\
             **Source:** {source}\n\n\
             **Abstract:** {excerpt}\n\n",
            index = i + 1,
            title = paper.title,
            authors = author_line(&paper.authors),
            year = paper.year,
            source = paper.source,
            excerpt = abstract_excerpt(&paper.r#abstract),
        ));
    }

    report.push_str(&format!(
        "## Key Findings

Based on the analysis of {count} papers:

1. **Research Scope**: The literature covers diverse methodologies and approaches to {query}
2. **Publication Timeline**: Papers span from recent publications to established foundational work
3. **Source Diversity**: Research comes from both peer-reviewed journals (PubMed) and preprint servers (ArXiv)

## Methodology Analysis

The selected papers employ various research methodologies:
- Experimental studies
- Systematic reviews
- Theoretical frameworks
- Clinical investigations

## Current Challenges and Limitations

Common challenges identified across the literature include:
- Need for larger sample sizes
- Standardization of methodologies
- Integration of interdisciplinary approaches
- Translation from research to practical applications

## Future Research Directions

Potential areas for future investigation:
- Advanced computational methods
- Cross-disciplinary collaboration
- Long-term longitudinal studies
- Real-world implementation studies

## Conclusion

This literature review of {count} papers provides a foundation for understanding the current state of research in {query}. The diversity of sources and methodologies represented offers multiple perspectives on this important research area.

## References

See the citations section below for complete bibliographic information for all referenced papers.
"
    ));

    Ok(report)
}

/// First three authors, then " et al." if there are more
pub fn author_line(authors: &[String]) -> String {
    let mut line = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_LISTED_AUTHORS {
        line.push_str(" et al.");
    }
    line
}

/// First 300 characters of the abstract followed by "...", always
pub fn abstract_excerpt(text: &str) -> String {
    let mut excerpt: String = text.chars().take(ABSTRACT_EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

/// Project each paper to a citation, numbered from 1
pub fn extract_citations(papers: &[SelectedPaper]) -> Vec<CitationRecord> {
    papers
        .iter()
        .enumerate()
        .map(|(i, paper)| CitationRecord {
            id: i + 1,
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            year: paper.year.clone(),
            source: paper.source.clone(),
            url: paper.url.clone(),
            journal: paper.journal.clone(),
            pmid: paper.pmid.clone(),
            arxiv_id: paper.arxiv_id.clone(),
        })
        .collect()
}

/// Report, citations, and the local time of generation
pub fn build_report(papers: &[SelectedPaper], query: &str) -> Result<GeneratedReport, ReportError> {
    let report = generate_report(papers, query)?;

    Ok(GeneratedReport {
        report,
        citations: extract_citations(papers),
        generated_at: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, authors: &[&str], abstract_text: &str) -> SelectedPaper {
        SelectedPaper {
            title: title.to_string(),
            r#abstract: abstract_text.to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            year: "2020".to_string(),
            source: "PubMed".to_string(),
            ..SelectedPaper::default()
        }
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert_eq!(generate_report(&[], "q"), Err(ReportError::NoPapers));
        assert_eq!(build_report(&[], "q"), Err(ReportError::NoPapers));
    }

    #[test]
    fn test_report_structure() {
        let papers = vec![
            paper("First", &["A", "B", "C", "D"], "Short abstract."),
            paper("Second", &["E"], "Another."),
        ];
        let report = generate_report(&papers, "diabetes").unwrap();

        assert!(report.starts_with("# Research Report: diabetes\n\n## Executive Summary\n"));
        assert!(report.contains("This report analyzes 2 selected papers related to \"diabetes\"."));
        assert!(report.contains("### [1] First\n\n**Authors:** A, B, C et al.  \n**Year:** 2020  \n**Source:** PubMed\n\n**Abstract:** Short abstract....\n\n"));
        assert!(report.contains("### [2] Second\n\n**Authors:** E  \n"));
        assert!(report.contains("This literature review of 2 papers provides a foundation for understanding the current state of research in diabetes."));

        let sections = [
            "## Literature Overview",
            "## Key Findings",
            "## Methodology Analysis",
            "## Current Challenges and Limitations",
            "## Future Research Directions",
            "## Conclusion",
            "## References",
        ];
        let mut last = 0;
        for section in sections {
            let at = report.find(section).unwrap();
            assert!(at > last, "{} out of order", section);
            last = at;
        }
        assert!(report.ends_with("for all referenced papers.\n"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let papers = vec![paper("T", &[], "x")];
        assert_eq!(
            generate_report(&papers, "q").unwrap(),
            generate_report(&papers, "q").unwrap()
        );
    }

    #[test]
    fn test_author_line() {
        let names = |n: &[&str]| n.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(author_line(&names(&[])), "");
        assert_eq!(author_line(&names(&["A", "B", "C"])), "A, B, C");
        assert_eq!(author_line(&names(&["A", "B", "C", "D"])), "A, B, C et al.");
    }

    #[test]
    fn test_abstract_excerpt_counts_characters() {
        let long = "é".repeat(500);
        let excerpt = abstract_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 303);
        assert!(excerpt.ends_with("..."));

        assert_eq!(abstract_excerpt("short"), "short...");
    }

    #[test]
    fn test_selected_paper_defaults() {
        let paper: SelectedPaper = serde_json::from_str("{}").unwrap();
        assert_eq!(paper.title, "Unknown Title");
        assert_eq!(paper.r#abstract, "No abstract available");
        assert_eq!(paper.year, "Unknown");
        assert_eq!(paper.source, "Unknown");
        assert_eq!(paper.url, "");
        assert_eq!(paper.pmid, "");

        let report = generate_report(&[paper], "q").unwrap();
        assert!(report.contains("### [1] Unknown Title"));
        assert!(report.contains("**Abstract:** No abstract available..."));
    }

    #[test]
    fn test_from_paper_record() {
        let record = PaperRecord::pubmed("123", "Lancet").title("T");
        let selected = SelectedPaper::from(&record);
        assert_eq!(selected.source, "PubMed");
        assert_eq!(selected.journal, "Lancet");
        assert_eq!(selected.pmid, "123");
        assert_eq!(selected.arxiv_id, "");
    }

    #[test]
    fn test_citations_numbered_from_one() {
        let papers = vec![paper("A", &[], ""), paper("B", &[], "")];
        let citations = extract_citations(&papers);
        assert_eq!(citations.iter().map(|c| c.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(citations[1].title, "B");
    }

    #[test]
    fn test_build_report_timestamp() {
        let built = build_report(&[paper("A", &[], "")], "q").unwrap();
        assert_eq!(built.citations.len(), 1);
        assert!(chrono::NaiveDateTime::parse_from_str(&built.generated_at, TIMESTAMP_FORMAT).is_ok());
    }
}
