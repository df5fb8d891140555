//! Shared fakes for the integration tests
//!
//! - FakeEngine: in-memory workflow engine with call log and failure switches
//! - ScriptedProvider: replays queued completions and records every request
//! - FakeSheets / FakeReport: fixed sheet rows and report text

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use ops_dashboard::agent::provider::{ChatProvider, Completion, CompletionRequest, ToolCall, Turn};
use ops_dashboard::config::{AppState, Config};
use ops_dashboard::error::{EngineError, GoogleError, ProviderError};
use ops_dashboard::n8n::WorkflowEngine;
use ops_dashboard::registry::WorkflowRegistry;
use ops_dashboard::report::ReportSource;
use ops_dashboard::sheets::{SheetKind, SheetSource};
use ops_dashboard::types::{EngineWorkflow, Execution, ExecutionStatus, SheetRow};

pub const NEW_CUSTOMER: &str = "LGzQHIALne_MHAHWtdBIQ";
pub const VOICE_AGENT: &str = "u4sSYc8PDieJxX_g6VMWl";
pub const PURCHASES: &str = "ETQm3I9t8ypv6V7eYAVyv";
pub const BLOG_CREATOR: &str = "lO1Z5m781nQe3HsPYUTch";

// ═══════════════════════════════════════════════════════════════════════════
// Workflow engine
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct StoredWorkflow {
    pub name: String,
    pub active: bool,
    pub definition: Value,
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub workflows: BTreeMap<String, StoredWorkflow>,
    pub executions: HashMap<String, Vec<Execution>>,
    pub created_bodies: Vec<Value>,
    pub calls: Vec<String>,
    pub next_copy: usize,
    pub fail_create: bool,
    pub fail_activate: HashSet<String>,
    pub fail_executions: bool,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    pub state: Mutex<EngineState>,
}

impl FakeEngine {
    /// The four registered automations, all switched on.
    pub fn seeded() -> Self {
        let engine = FakeEngine::default();
        {
            let mut state = engine.state.lock().unwrap();
            for meta in WorkflowRegistry::default().iter() {
                state.workflows.insert(
                    meta.id.clone(),
                    StoredWorkflow {
                        name: meta.name.clone(),
                        active: true,
                        definition: json!({
                            "id": meta.id,
                            "name": meta.name,
                            "active": true,
                            "nodes": [
                                {"id": "1", "name": "Schedule", "type": "n8n-nodes-base.scheduleTrigger"},
                                {"id": "2", "name": "Publish", "type": "n8n-nodes-base.shopify", "parameters": {"operation": "create"}}
                            ],
                            "connections": {"Schedule": {"main": [[{"node": "Publish", "type": "main", "index": 0}]]}},
                            "settings": {"timezone": "UTC"},
                            "tags": []
                        }),
                    },
                );
            }
        }
        engine
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .workflows
            .get(id)
            .map(|w| w.active)
            .unwrap_or(false)
    }

    pub fn active_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .workflows
            .iter()
            .filter(|(_, w)| w.active)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created_bodies(&self) -> Vec<Value> {
        self.state.lock().unwrap().created_bodies.clone()
    }

    pub fn add_executions(&self, id: &str, executions: Vec<Execution>) {
        self.state
            .lock()
            .unwrap()
            .executions
            .insert(id.to_string(), executions);
    }

    /// Switch a workflow off without recording an engine call.
    pub fn switch_off(&self, id: &str) {
        if let Some(w) = self.state.lock().unwrap().workflows.get_mut(id) {
            w.active = false;
        }
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_activation_of(&self, id: &str) {
        self.state.lock().unwrap().fail_activate.insert(id.to_string());
    }

    pub fn fail_executions(&self) {
        self.state.lock().unwrap().fail_executions = true;
    }

    fn set_active(&self, id: &str, active: bool) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let verb = if active { "activate" } else { "deactivate" };
        state.calls.push(format!("{} {}", verb, id));
        if active && state.fail_activate.contains(id) {
            return Err(EngineError::Status { status: 500 });
        }
        let workflow = state
            .workflows
            .get_mut(id)
            .ok_or(EngineError::Status { status: 404 })?;
        workflow.active = active;
        Ok(())
    }
}

#[async_trait]
impl WorkflowEngine for FakeEngine {
    async fn list_workflows(&self) -> Result<Vec<EngineWorkflow>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .workflows
            .iter()
            .map(|(id, w)| EngineWorkflow {
                id: id.clone(),
                name: w.name.clone(),
                active: w.active,
                updated_at: Some("2026-10-01T08:00:00.000Z".to_string()),
            })
            .collect())
    }

    async fn get_workflow(&self, id: &str) -> Result<Value, EngineError> {
        let state = self.state.lock().unwrap();
        state
            .workflows
            .get(id)
            .map(|w| {
                let mut definition = w.definition.clone();
                definition["active"] = Value::Bool(w.active);
                definition
            })
            .ok_or(EngineError::Status { status: 404 })
    }

    async fn activate(&self, id: &str) -> Result<(), EngineError> {
        self.set_active(id, true)
    }

    async fn deactivate(&self, id: &str) -> Result<(), EngineError> {
        self.set_active(id, false)
    }

    async fn create_workflow(&self, body: &Value) -> Result<EngineWorkflow, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create".to_string());
        if state.fail_create {
            return Err(EngineError::Status { status: 400 });
        }
        state.next_copy += 1;
        let id = format!("copy-{}", state.next_copy);
        let name = body["name"].as_str().unwrap_or_default().to_string();
        state.created_bodies.push(body.clone());
        state.workflows.insert(
            id.clone(),
            StoredWorkflow {
                name: name.clone(),
                active: false,
                definition: body.clone(),
            },
        );
        Ok(EngineWorkflow {
            id,
            name,
            active: false,
            updated_at: None,
        })
    }

    async fn list_executions(
        &self,
        workflow_id: &str,
        _limit: usize,
    ) -> Result<Vec<Execution>, EngineError> {
        let state = self.state.lock().unwrap();
        if state.fail_executions {
            return Err(EngineError::Status { status: 503 });
        }
        Ok(state.executions.get(workflow_id).cloned().unwrap_or_default())
    }
}

pub fn execution(id: &str, status: ExecutionStatus, started_at: &str) -> Execution {
    Execution {
        id: id.to_string(),
        status,
        started_at: Some(started_at.to_string()),
        stopped_at: Some(started_at.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LLM provider
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    repeat: Option<Completion>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Answers every round with the same completion.
    pub fn repeating(completion: Completion) -> Self {
        Self {
            repeat: Some(completion),
            ..Default::default()
        }
    }

    /// Transcripts seen by each round, in order.
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(request.turns.to_vec());
        if let Some(completion) = &self.repeat {
            return Ok(completion.clone());
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Completion::Text(None)))
    }
}

pub fn text(reply: &str) -> Result<Completion, ProviderError> {
    Ok(Completion::Text(Some(reply.to_string())))
}

pub fn tool_round(calls: Vec<ToolCall>) -> Result<Completion, ProviderError> {
    Ok(Completion::ToolCalls { text: None, calls })
}

pub fn call(id: &str, name: &str, input: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        input,
    }
}

/// Tool results carried by the last turn of a recorded transcript.
pub fn last_results(turns: &[Turn]) -> Vec<(String, Value)> {
    match turns.last() {
        Some(Turn::ToolResults(results)) => results
            .iter()
            .map(|r| (r.call_id.clone(), serde_json::from_str(&r.content).unwrap()))
            .collect(),
        other => panic!("expected tool results, got {:?}", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sheets and report
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct FakeSheets {
    pub customers: Vec<SheetRow>,
    pub content: Vec<SheetRow>,
    pub fail: bool,
}

#[async_trait]
impl SheetSource for FakeSheets {
    async fn rows(&self, sheet: SheetKind) -> Result<Vec<SheetRow>, GoogleError> {
        if self.fail {
            return Err(GoogleError::Status {
                status: 403,
                body: "forbidden".to_string(),
            });
        }
        Ok(match sheet {
            SheetKind::Customers => self.customers.clone(),
            SheetKind::Content => self.content.clone(),
        })
    }
}

pub struct FakeReport {
    pub text: Option<String>,
}

#[async_trait]
impl ReportSource for FakeReport {
    async fn fetch_text(&self) -> Result<String, GoogleError> {
        self.text.clone().ok_or(GoogleError::NotConfigured)
    }
}

pub fn row(cells: &[(&str, &str)]) -> SheetRow {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// App state
// ═══════════════════════════════════════════════════════════════════════════

pub struct TestApp {
    pub state: AppState,
    pub engine: Arc<FakeEngine>,
    pub anthropic: Arc<ScriptedProvider>,
    pub openai: Arc<ScriptedProvider>,
}

pub fn test_app(
    engine: FakeEngine,
    sheets: FakeSheets,
    report: FakeReport,
    anthropic: ScriptedProvider,
    openai: ScriptedProvider,
) -> TestApp {
    let engine = Arc::new(engine);
    let anthropic = Arc::new(anthropic);
    let openai = Arc::new(openai);

    let state = AppState {
        config: Arc::new(Config::default()),
        registry: Arc::new(WorkflowRegistry::default()),
        engine: engine.clone(),
        sheets: Arc::new(sheets),
        report: Arc::new(report),
        anthropic: anthropic.clone(),
        openai: openai.clone(),
    };

    TestApp {
        state,
        engine,
        anthropic,
        openai,
    }
}
