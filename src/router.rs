//! Route table and middleware stack.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppState;
use crate::handlers::*;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Assistant
        .route("/chat", post(chat_handler))
        // Workflows
        .route("/workflows", get(workflows_handler))
        .route("/workflow-detail/:id", get(workflow_detail_handler))
        // Sheets
        .route("/sheets", get(sheets_handler))
        .route("/sheets/analytics", get(analytics_handler))
        .route("/sheets/purchase-stats", get(purchase_stats_handler))
        .route("/sheets/purchase-history", get(purchase_history_handler))
        // Report
        .route("/docs", get(docs_handler))
        // Health check
        .route("/healthz", get(health_handler))
        // Add CORS support
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
