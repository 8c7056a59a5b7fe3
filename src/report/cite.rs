//! Citation formatting in various styles.
//!
//! Supports APA 7th, MLA 9th, and BibTeX. Author names are expected in
//! "First Last" order, as the sources produce them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::CitationRecord;
use crate::models::UNKNOWN;

/// Citation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationStyle {
    /// APA 7th edition
    Apa,
    /// MLA 9th edition
    Mla,
    /// BibTeX
    Bibtex,
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationStyle::Apa => write!(f, "APA 7th"),
            CitationStyle::Mla => write!(f, "MLA 9th"),
            CitationStyle::Bibtex => write!(f, "BibTeX"),
        }
    }
}

/// Format a citation in the specified style
pub fn format_citation(citation: &CitationRecord, style: CitationStyle) -> String {
    match style {
        CitationStyle::Apa => format_apa(citation),
        CitationStyle::Mla => format_mla(citation),
        CitationStyle::Bibtex => format_bibtex(citation),
    }
}

/// Split "First Middle Last" into ("Last", ["First", "Middle"])
fn split_name(author: &str) -> (&str, Vec<&str>) {
    let mut words: Vec<&str> = author.split_whitespace().collect();
    match words.pop() {
        Some(last) => (last, words),
        None => (author, Vec::new()),
    }
}

/// "Jane Q Smith" -> "Smith, J. Q."
fn format_author_apa(author: &str) -> String {
    let (last, given) = split_name(author);
    if given.is_empty() {
        return last.to_string();
    }
    let initials: Vec<String> = given
        .iter()
        .filter_map(|n| n.chars().next())
        .map(|c| format!("{}.", c))
        .collect();
    format!("{}, {}", last, initials.join(" "))
}

/// Format authors as "Last, F., Last, F., & Last, F."
fn format_authors_apa(authors: &[String]) -> String {
    let formatted: Vec<String> = authors.iter().map(|a| format_author_apa(a)).collect();

    match formatted.as_slice() {
        [] => "Anonymous".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{}, & {}", first, second),
        // APA: up to 20 authors, then ellipsis and the final author
        [head @ .., last] if formatted.len() <= 20 => format!("{}, & {}", head.join(", "), last),
        [..] => format!(
            "{}, ... {}",
            formatted[..19].join(", "),
            formatted[formatted.len() - 1]
        ),
    }
}

/// "Jane Smith" -> "Smith, Jane"
fn format_author_inverted(author: &str) -> String {
    let (last, given) = split_name(author);
    if given.is_empty() {
        last.to_string()
    } else {
        format!("{}, {}", last, given.join(" "))
    }
}

/// Format authors as "Last, First", "Last, First, and First Last" or "Last, First, et al"
fn format_authors_mla(authors: &[String]) -> String {
    match authors {
        [] => "Anonymous".to_string(),
        [only] => format_author_inverted(only),
        [first, second] => format!("{}, and {}", format_author_inverted(first), second),
        [first, ..] => format!("{}, et al", format_author_inverted(first)),
    }
}

fn year_or_nd(citation: &CitationRecord) -> &str {
    if citation.year.is_empty() || citation.year == UNKNOWN {
        "n.d."
    } else {
        &citation.year
    }
}

/// Journal for PubMed records, otherwise the source name
fn container(citation: &CitationRecord) -> &str {
    if citation.journal.is_empty() {
        &citation.source
    } else {
        &citation.journal
    }
}

fn strip_terminal_period(title: &str) -> &str {
    title.strip_suffix('.').unwrap_or(title)
}

/// Format in APA 7th edition
/// Format: Author, A. A., & Author, B. B. (Year). Title. Container. URL
fn format_apa(citation: &CitationRecord) -> String {
    let mut out = format!(
        "{}. ({}). {}. {}.",
        strip_terminal_period(&format_authors_apa(&citation.authors)),
        year_or_nd(citation),
        strip_terminal_period(&citation.title),
        container(citation)
    );
    if !citation.url.is_empty() {
        out.push(' ');
        out.push_str(&citation.url);
    }
    out
}

/// Format in MLA 9th edition
/// Format: Author. "Title." Container, Year, URL.
fn format_mla(citation: &CitationRecord) -> String {
    let title = strip_terminal_period(&citation.title);
    let authors = format_authors_mla(&citation.authors);

    if citation.url.is_empty() {
        format!(
            "{}. \"{}.\" {}, {}.",
            authors,
            title,
            container(citation),
            year_or_nd(citation)
        )
    } else {
        format!(
            "{}. \"{}.\" {}, {}, {}.",
            authors,
            title,
            container(citation),
            year_or_nd(citation),
            citation.url
        )
    }
}

/// Citation key: first author's last name, year, first word of the title
fn bibtex_key(citation: &CitationRecord) -> String {
    let last_name = citation
        .authors
        .first()
        .map(|a| split_name(a).0)
        .unwrap_or("anonymous");
    let year = if citation.year == UNKNOWN { "" } else { citation.year.as_str() };
    let title_word = citation
        .title
        .split_whitespace()
        .find(|w| w.chars().any(char::is_alphanumeric))
        .unwrap_or("");

    format!("{}{}{}", last_name, year, title_word)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Generate a BibTeX entry
///
/// PubMed records become `@article` with journal and pmid, arXiv records
/// become `@misc` with the eprint fields.
fn format_bibtex(citation: &CitationRecord) -> String {
    let authors = citation
        .authors
        .iter()
        .map(|a| format_author_inverted(a))
        .collect::<Vec<_>>()
        .join(" and ");

    let mut fields = vec![
        ("author", authors),
        ("title", citation.title.clone()),
    ];

    let entry_type = if !citation.arxiv_id.is_empty() {
        fields.push(("eprint", citation.arxiv_id.clone()));
        fields.push(("archivePrefix", "arXiv".to_string()));
        "misc"
    } else {
        fields.push(("journal", container(citation).to_string()));
        if !citation.pmid.is_empty() {
            fields.push(("pmid", citation.pmid.clone()));
        }
        "article"
    };

    if citation.year != UNKNOWN && !citation.year.is_empty() {
        fields.push(("year", citation.year.clone()));
    }
    if !citation.url.is_empty() {
        fields.push(("url", citation.url.clone()));
    }

    let body = fields
        .iter()
        .map(|(key, value)| format!("  {} = {{{}}}", key, value))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("@{}{{{},\n{}\n}}", entry_type, bibtex_key(citation), body)
}
