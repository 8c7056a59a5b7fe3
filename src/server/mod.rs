//! HTTP server exposing search, refinement and report generation.
//!
//! Every route is served both at the root and under `/api`:
//!
//! | Method | Path               | Body                  |
//! |--------|--------------------|-----------------------|
//! | POST   | `/search`          | `{query}`             |
//! | POST   | `/refine_query`    | `{query, context?}`   |
//! | POST   | `/generate_report` | `{papers, query}`     |
//! | GET    | `/health`          |                       |

mod error;
mod handlers;

pub use error::ApiError;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::aggregator::Aggregator;
use crate::config::ServerConfig;

/// Shared state injected into every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the full router
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    let routes = Router::new()
        .route("/search", post(handlers::search))
        .route("/refine_query", post(handlers::refine))
        .route("/generate_report", post(handlers::generate_report))
        .route("/health", get(handlers::health));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        // Middleware
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    ApiError::Internal("Internal server error".to_string()).into_response()
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
