//! Rule-based query refinement.
//!
//! Suggests follow-up questions and narrower queries for a free-text search
//! without contacting any source.

use serde::{Deserialize, Serialize};

/// Suffixes appended to the query to build refined queries
pub const REFINEMENT_SUFFIXES: [&str; 4] = [
    "recent advances",
    "systematic review",
    "clinical trials",
    "machine learning",
];

const EXPLANATION: &str =
    "These suggestions can help narrow down your search and find more specific results.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefineError {
    #[error("Original query is required")]
    EmptyQuery,
}

/// Suggestions for narrowing a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRefinement {
    pub follow_up_questions: Vec<String>,
    pub refined_queries: Vec<String>,
    pub explanation: String,
}

/// Build follow-up questions and refined queries for `query`
pub fn refine_query(query: &str) -> Result<QueryRefinement, RefineError> {
    if query.is_empty() {
        return Err(RefineError::EmptyQuery);
    }

    let follow_up_questions = vec![
        format!("What specific aspect of '{}' are you most interested in?", query),
        format!(
            "Are you looking for recent research (last 5 years) on '{}'?",
            query
        ),
        format!(
            "Do you want to focus on clinical studies or theoretical research about '{}'?",
            query
        ),
        format!(
            "Are there specific methodologies you want to see in '{}' research?",
            query
        ),
    ];

    let refined_queries = REFINEMENT_SUFFIXES
        .iter()
        .map(|suffix| format!("{} {}", query, suffix))
        .collect();

    Ok(QueryRefinement {
        follow_up_questions,
        refined_queries,
        explanation: EXPLANATION.to_string(),
    })
}
