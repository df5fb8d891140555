//! HTTP request handlers for the dashboard endpoints
//!
//! - POST /chat
//! - GET /workflows
//! - GET /workflow-detail/:id
//! - GET /sheets?sheet=customers|content
//! - GET /sheets/analytics?range=
//! - GET /sheets/purchase-stats
//! - GET /sheets/purchase-history
//! - GET /docs
//! - GET /healthz
//!
//! Every response uses the `{success, ...}` envelope; failures go through
//! [`ApiError`].

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::agent::provider::ProviderKind;
use crate::agent::Agent;
use crate::analytics::{self, TimeRange};
use crate::config::AppState;
use crate::error::ApiError;
use crate::report::parse_report;
use crate::sheets::SheetKind;
use crate::timeline::build_timeline;
use crate::types::ChatRequest;
use crate::workflows::fetch_workflows;

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    pub sheet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Assistant
// ═══════════════════════════════════════════════════════════════════════════

/// POST /chat
///
/// Body: `{messages: [{role, content}], provider?: "anthropic" | "openai"}`
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::BadRequest("Invalid messages".to_string()))?;
    let messages = body
        .messages
        .ok_or_else(|| ApiError::BadRequest("Invalid messages".to_string()))?;

    let kind = ProviderKind::parse(body.provider.as_deref());
    info!(provider = kind.name(), turns = messages.len(), "chat request");

    let provider = state.provider(kind);
    let reply = Agent::from_state(&state)
        .converse(provider.as_ref(), &messages)
        .await
        .inspect_err(|e| error!(provider = kind.name(), "chat failed: {}", e))?;

    Ok(Json(json!({ "success": true, "reply": reply })))
}

// ═══════════════════════════════════════════════════════════════════════════
// Workflows
// ═══════════════════════════════════════════════════════════════════════════

/// GET /workflows
pub async fn workflows_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let data = fetch_workflows(state.engine.as_ref(), &state.registry, today).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /workflow-detail/:id
pub async fn workflow_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = state.engine.get_workflow(&id).await?;
    let timeline = build_timeline(&workflow);
    Ok(Json(json!({ "success": true, "timeline": timeline })))
}

// ═══════════════════════════════════════════════════════════════════════════
// Sheets
// ═══════════════════════════════════════════════════════════════════════════

/// GET /sheets?sheet=customers|content
pub async fn sheets_handler(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query
        .sheet
        .as_deref()
        .and_then(SheetKind::parse)
        .ok_or_else(|| ApiError::BadRequest("Invalid sheet".to_string()))?;

    let data = state.sheets.rows(kind).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /sheets/analytics?range=this_month|last_3_months|all_time
pub async fn analytics_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = TimeRange::parse(query.range.as_deref());
    let rows = state.sheets.rows(SheetKind::Customers).await?;
    let data = analytics::aggregate(&rows, range, Local::now().date_naive());
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /sheets/purchase-stats
pub async fn purchase_stats_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.sheets.rows(SheetKind::Customers).await?;
    let data = analytics::purchase_stats(&rows, Local::now().date_naive());
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /sheets/purchase-history
pub async fn purchase_history_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.sheets.rows(SheetKind::Customers).await?;
    let data = analytics::purchase_history(&rows, Local::now().date_naive());
    Ok(Json(json!({ "success": true, "data": data })))
}

// ═══════════════════════════════════════════════════════════════════════════
// Report
// ═══════════════════════════════════════════════════════════════════════════

/// GET /docs
pub async fn docs_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let text = state.report.fetch_text().await?;
    let report = parse_report(&text);
    Ok(Json(json!({
        "success": true,
        "month": report.month,
        "sections": report.sections,
    })))
}

// ═══════════════════════════════════════════════════════════════════════════
// Health Check
// ═══════════════════════════════════════════════════════════════════════════

/// GET /healthz
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
