//! Data types shared by the clients, the aggregator and the HTTP surface
//!
//! Field names serialize in camelCase to match what the dashboard pages read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════
// Workflow Types
// ═══════════════════════════════════════════════════════════════════════════

/// Outcome of one run, as reported by the workflow engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Waiting,
    Running,
    #[serde(other)]
    Unknown,
}

/// One historical run of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub started_at: Option<String>,
    /// Null while the run is still going.
    #[serde(default)]
    pub stopped_at: Option<String>,
}

/// Workflow summary as listed by the engine (`GET /workflows`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineWorkflow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Derived run statistics for a workflow card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStats {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    pub success_rate: u32,
    pub last_run: Option<String>,
    pub monthly_runs: usize,
    pub monthly_success: usize,
}

/// A registered workflow merged with its live engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub active: bool,
    pub updated_at: Option<String>,
    pub executions: Vec<Execution>,
    pub stats: WorkflowStats,
}

/// One plain-language step of a workflow timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_branch_point: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<TimelineBranch>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineBranch {
    pub label: String,
    pub steps: Vec<TimelineStep>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Chat Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the transcript the dashboard resends on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub provider: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Sheet Types
// ═══════════════════════════════════════════════════════════════════════════

/// Header → cell text. No typed schema; consumers parse defensively.
pub type SheetRow = HashMap<String, String>;

// ═══════════════════════════════════════════════════════════════════════════
// Analytics Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct InterestBreakdown {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub not_interested: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CallOutcomes {
    pub interested: usize,
    pub not_interested: usize,
    pub needs_more_info: usize,
    pub no_decision: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyIntent {
    pub date: String,
    pub current: f64,
    pub previous: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyHotLeads {
    pub date: String,
    pub hot_leads: usize,
    pub purchases: usize,
}

/// Headline numbers compared between the current and previous period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub total_customers: usize,
    pub calls_answered: usize,
    pub answer_rate: u32,
    pub avg_purchase_intent: f64,
    pub interested_pct: u32,
    pub objection_count: usize,
    pub total_purchases_post_call: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalytics {
    pub total_customers: usize,
    pub calls_answered: usize,
    pub answer_rate: u32,
    pub avg_purchase_intent: f64,
    pub interest_breakdown: InterestBreakdown,
    pub sentiment_breakdown: SentimentBreakdown,
    pub top_objections: Vec<LabelCount>,
    pub call_outcomes: CallOutcomes,
    pub range_label: String,
    pub daily_intent: Vec<DailyIntent>,
    pub daily_hot_leads: Vec<DailyHotLeads>,
    pub total_purchases_post_call: usize,
    pub interested_pct: u32,
    pub objection_count: usize,
    pub previous_period: Option<PeriodSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStats {
    pub this_month: f64,
    pub last3_months: f64,
    pub all_time: f64,
    pub this_month_count: usize,
    pub last3_months_count: usize,
    pub all_time_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPurchase {
    /// e.g. "Jan 2026"
    pub month: String,
    pub total: f64,
    pub count: usize,
}

// ═══════════════════════════════════════════════════════════════════════════
// Report Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub preview: String,
    pub content: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub month: String,
    pub sections: Vec<ReportSection>,
}
