//! Tools the assistant may call, and their executor
//!
//! Model-supplied arguments are validated into [`ToolInput`] before anything
//! touches the engine; malformed input is rejected, never guessed at.

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::agent::provider::{ToolCall, ToolSpec};
use crate::error::ToolError;
use crate::n8n::{filter_create_body, WorkflowEngine};
use crate::registry::WorkflowRegistry;
use crate::workflows::fetch_workflows;

pub const GET_WORKFLOWS: &str = "get_workflows";
pub const GET_WORKFLOW_DETAIL: &str = "get_workflow_detail";
pub const TOGGLE_WORKFLOW: &str = "toggle_workflow";
pub const CREATE_SAFE_COPY: &str = "create_safe_copy";
pub const RESTORE_ORIGINAL: &str = "restore_original";

/// The five tools, in the order they are advertised.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: GET_WORKFLOWS,
            description: "Get the current status and recent performance of all the managed workflows.",
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolSpec {
            name: GET_WORKFLOW_DETAIL,
            description: "Get the full technical details of a specific workflow — needed before making any changes.",
            parameters: json!({
                "type": "object",
                "properties": {"workflow_id": {"type": "string", "description": "The workflow ID"}},
                "required": ["workflow_id"],
            }),
        },
        ToolSpec {
            name: TOGGLE_WORKFLOW,
            description: "Turn a workflow on (running) or off.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "workflow_id": {"type": "string"},
                    "action": {"type": "string", "enum": ["activate", "deactivate"]},
                },
                "required": ["workflow_id", "action"],
            }),
        },
        ToolSpec {
            name: CREATE_SAFE_COPY,
            description: "Safely edit a workflow: deactivates the original (kept as backup), creates a modified copy, and turns the copy on. Use for ALL edits.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "original_id": {"type": "string"},
                    "modified_workflow": {"type": "object"},
                    "change_summary": {"type": "string", "description": "Plain English description of what changed"},
                },
                "required": ["original_id", "modified_workflow", "change_summary"],
            }),
        },
        ToolSpec {
            name: RESTORE_ORIGINAL,
            description: "Roll back an edit by turning off the modified copy and turning the original back on.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "original_id": {"type": "string"},
                    "modified_copy_id": {"type": "string"},
                },
                "required": ["original_id", "modified_copy_id"],
            }),
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRef {
    pub workflow_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToggleArgs {
    pub workflow_id: String,
    pub action: ToggleAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SafeCopyArgs {
    pub original_id: String,
    pub modified_workflow: Map<String, Value>,
    pub change_summary: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestoreArgs {
    pub original_id: String,
    pub modified_copy_id: String,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    GetWorkflows,
    GetWorkflowDetail(WorkflowRef),
    ToggleWorkflow(ToggleArgs),
    CreateSafeCopy(SafeCopyArgs),
    RestoreOriginal(RestoreArgs),
}

fn args<T: DeserializeOwned>(tool: &str, input: &Value) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

impl ToolInput {
    pub fn parse(name: &str, input: &Value) -> Result<Self, ToolError> {
        match name {
            GET_WORKFLOWS => Ok(ToolInput::GetWorkflows),
            GET_WORKFLOW_DETAIL => Ok(ToolInput::GetWorkflowDetail(args(name, input)?)),
            TOGGLE_WORKFLOW => Ok(ToolInput::ToggleWorkflow(args(name, input)?)),
            CREATE_SAFE_COPY => Ok(ToolInput::CreateSafeCopy(args(name, input)?)),
            RESTORE_ORIGINAL => Ok(ToolInput::RestoreOriginal(args(name, input)?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Executor
// ═══════════════════════════════════════════════════════════════════════════

/// Runs validated tool calls against the workflow engine.
pub struct ToolExecutor<'a> {
    engine: &'a dyn WorkflowEngine,
    registry: &'a WorkflowRegistry,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(engine: &'a dyn WorkflowEngine, registry: &'a WorkflowRegistry) -> Self {
        Self { engine, registry }
    }

    /// Execute one call and return its JSON result text.
    ///
    /// Failures are returned as `{"error": message}` rather than raised.
    pub async fn execute(&self, call: &ToolCall) -> String {
        let outcome = match ToolInput::parse(&call.name, &call.input) {
            Ok(input) => self.dispatch(input).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => value.to_string(),
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }

    async fn dispatch(&self, input: ToolInput) -> Result<Value, ToolError> {
        match input {
            ToolInput::GetWorkflows => self.get_workflows().await,
            ToolInput::GetWorkflowDetail(r) => Ok(self.engine.get_workflow(&r.workflow_id).await?),
            ToolInput::ToggleWorkflow(t) => self.toggle(t).await,
            ToolInput::CreateSafeCopy(c) => self.create_safe_copy(c).await,
            ToolInput::RestoreOriginal(r) => self.restore_original(r).await,
        }
    }

    async fn get_workflows(&self) -> Result<Value, ToolError> {
        let today = Local::now().date_naive();
        let workflows = fetch_workflows(self.engine, self.registry, today).await?;
        let summaries: Vec<Value> = workflows
            .iter()
            .map(|wf| {
                json!({
                    "id": wf.id,
                    "name": wf.name,
                    "description": wf.description,
                    "active": wf.active,
                    "totalRuns": wf.stats.total,
                    "successRate": wf.stats.success_rate,
                    "errors": wf.stats.error,
                    "lastRun": wf.stats.last_run,
                })
            })
            .collect();
        Ok(Value::Array(summaries))
    }

    async fn toggle(&self, args: ToggleArgs) -> Result<Value, ToolError> {
        let name = self.registry.display_name(&args.workflow_id);
        let state = match args.action {
            ToggleAction::Activate => {
                self.engine.activate(&args.workflow_id).await?;
                "on"
            }
            ToggleAction::Deactivate => {
                self.engine.deactivate(&args.workflow_id).await?;
                "off"
            }
        };
        info!(workflow_id = %args.workflow_id, state, "workflow toggled");
        Ok(json!({
            "success": true,
            "message": format!("{} has been turned {}.", name, state),
        }))
    }

    /// Deactivate the original, create and activate the edited copy.
    ///
    /// When any step after the deactivation fails the original is put back
    /// in the state it had before the call.
    async fn create_safe_copy(&self, args: SafeCopyArgs) -> Result<Value, ToolError> {
        let was_active = self
            .engine
            .get_workflow(&args.original_id)
            .await?
            .get("active")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        self.engine.deactivate(&args.original_id).await?;

        match self.publish_copy(&args).await {
            Ok(new_id) => {
                info!(original_id = %args.original_id, %new_id, "safe copy activated");
                Ok(json!({
                    "success": true,
                    "originalId": args.original_id,
                    "newId": new_id,
                    "changeSummary": args.change_summary,
                }))
            }
            Err(e) if was_active => {
                warn!(original_id = %args.original_id, error = %e, "safe copy failed; reactivating original");
                if let Err(restore) = self.engine.activate(&args.original_id).await {
                    error!(original_id = %args.original_id, error = %restore, "could not reactivate original");
                }
                Err(e)
            }
            Err(e) => {
                warn!(original_id = %args.original_id, error = %e, "safe copy failed; original stays off");
                Err(e)
            }
        }
    }

    async fn publish_copy(&self, args: &SafeCopyArgs) -> Result<String, ToolError> {
        let name = args
            .modified_workflow
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} (Edited)", self.registry.display_name(&args.original_id)));

        let mut workflow = args.modified_workflow.clone();
        workflow.insert("name".to_string(), Value::String(name));
        let body = filter_create_body(&Value::Object(workflow));

        let created = self.engine.create_workflow(&body).await?;
        self.engine.activate(&created.id).await?;
        Ok(created.id)
    }

    async fn restore_original(&self, args: RestoreArgs) -> Result<Value, ToolError> {
        self.engine.deactivate(&args.modified_copy_id).await?;
        self.engine.activate(&args.original_id).await?;
        info!(original_id = %args.original_id, copy_id = %args.modified_copy_id, "original restored");
        Ok(json!({ "success": true, "message": "Original workflow restored." }))
    }
}
