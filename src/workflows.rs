//! Dashboard view of the managed workflows
//!
//! Merges the registry's display metadata with live engine state and recent
//! runs. A failed executions lookup degrades to an empty list for that one
//! workflow instead of failing the whole response.

use chrono::{DateTime, Datelike, NaiveDate};
use futures::future::join_all;
use tracing::warn;

use crate::error::EngineError;
use crate::n8n::WorkflowEngine;
use crate::registry::WorkflowRegistry;
use crate::types::{Execution, ExecutionStatus, Workflow, WorkflowStats};

/// How many recent runs are pulled per workflow.
pub const EXECUTION_LIMIT: usize = 25;

pub async fn fetch_workflows(
    engine: &dyn WorkflowEngine,
    registry: &WorkflowRegistry,
    today: NaiveDate,
) -> Result<Vec<Workflow>, EngineError> {
    let all = engine.list_workflows().await?;

    let present: Vec<_> = registry
        .iter()
        .filter_map(|meta| all.iter().find(|w| w.id == meta.id).map(|wf| (meta, wf)))
        .collect();

    let executions = join_all(present.iter().map(|(meta, _)| async move {
        match engine.list_executions(&meta.id, EXECUTION_LIMIT).await {
            Ok(list) => list,
            Err(e) => {
                warn!(workflow_id = %meta.id, "executions unavailable: {}", e);
                Vec::new()
            }
        }
    }))
    .await;

    Ok(present
        .into_iter()
        .zip(executions)
        .map(|((meta, wf), executions)| Workflow {
            id: meta.id.clone(),
            name: meta.name.clone(),
            description: meta.description.clone(),
            icon: meta.icon.clone(),
            active: wf.active,
            updated_at: wf.updated_at.clone(),
            stats: compute_stats(&executions, today),
            executions,
        })
        .collect())
}

/// Run statistics over the most-recent-first execution list.
pub fn compute_stats(executions: &[Execution], today: NaiveDate) -> WorkflowStats {
    let total = executions.len();
    let success = count_status(executions.iter(), ExecutionStatus::Success);
    let error = count_status(executions.iter(), ExecutionStatus::Error);

    let this_month: Vec<&Execution> = executions
        .iter()
        .filter(|e| {
            e.started_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.year() == today.year() && d.month() == today.month())
                .unwrap_or(false)
        })
        .collect();

    WorkflowStats {
        total,
        success,
        error,
        success_rate: percent(success, total),
        last_run: executions
            .first()
            .and_then(|e| e.stopped_at.clone().or_else(|| e.started_at.clone())),
        monthly_runs: this_month.len(),
        monthly_success: count_status(this_month.into_iter(), ExecutionStatus::Success),
    }
}

fn count_status<'a>(iter: impl Iterator<Item = &'a Execution>, status: ExecutionStatus) -> usize {
    iter.filter(|e| e.status == status).count()
}

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}
