//! Request handlers for the JSON API.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::SharedState;
use crate::models::SearchQuery;
use crate::refine::refine_query;
use crate::report::{build_report, SelectedPaper};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    /// Per-source page size; the server default applies when absent
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    #[serde(default)]
    pub query: String,
    /// Accepted for compatibility; suggestions do not depend on it
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub papers: Vec<SelectedPaper>,
    #[serde(default)]
    pub query: String,
}

/// POST /search - query every source and merge the results
pub async fn search(
    State(state): State<SharedState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let results = match request.max_results {
        Some(max) => {
            state
                .aggregator
                .search_with(&SearchQuery::new(request.query).max_results(max))
                .await?
        }
        None => state.aggregator.search_all(&request.query).await?,
    };

    Ok(Json(results))
}

/// POST /refine_query - rule-based follow-up questions and refined queries
pub async fn refine(
    payload: Result<Json<RefineRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    tracing::debug!(with_context = request.context.is_some(), "Refining '{}'", request.query);
    Ok(Json(refine_query(&request.query)?))
}

/// POST /generate_report - report text and citations for selected papers
pub async fn generate_report(
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let report = build_report(&request.papers, &request.query)?;
    tracing::info!("Generated report over {} papers", request.papers.len());
    Ok(Json(report))
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sources": state.aggregator.registry().ids().collect::<Vec<_>>(),
    }))
}
