//! Workflow engine client (n8n public REST API)
//!
//! - GET  /workflows, GET /workflows/{id}
//! - POST /workflows/{id}/activate, POST /workflows/{id}/deactivate
//! - POST /workflows
//! - GET  /executions?workflowId=&limit=

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::EngineError;
use crate::types::{EngineWorkflow, Execution};

/// Fields the engine accepts on create; anything else is rejected upstream.
pub const CREATE_ALLOWED_FIELDS: [&str; 5] =
    ["name", "nodes", "connections", "settings", "staticData"];

/// Operations the dashboard and the assistant need from the workflow engine.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    async fn list_workflows(&self) -> Result<Vec<EngineWorkflow>, EngineError>;

    /// Full definition (steps, connections, settings).
    async fn get_workflow(&self, id: &str) -> Result<Value, EngineError>;

    async fn activate(&self, id: &str) -> Result<(), EngineError>;

    async fn deactivate(&self, id: &str) -> Result<(), EngineError>;

    /// Create a workflow from an already-filtered body; returns the new record.
    async fn create_workflow(&self, body: &Value) -> Result<EngineWorkflow, EngineError>;

    async fn list_executions(&self, workflow_id: &str, limit: usize)
    -> Result<Vec<Execution>, EngineError>;
}

/// Keep only the fields the engine allows on `POST /workflows`.
///
/// `settings` defaults to `{}` because the engine requires it on create.
pub fn filter_create_body(workflow: &Value) -> Value {
    let mut body = Map::new();
    if let Some(obj) = workflow.as_object() {
        for key in CREATE_ALLOWED_FIELDS {
            if let Some(v) = obj.get(key) {
                body.insert(key.to_string(), v.clone());
            }
        }
    }
    body.entry("settings").or_insert_with(|| Value::Object(Map::new()));
    Value::Object(body)
}

#[derive(Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

// ═══════════════════════════════════════════════════════════════════════════
// n8n Client
// ═══════════════════════════════════════════════════════════════════════════

pub struct N8nClient {
    base_url: Option<String>,
    api_key: String,
    http_client: reqwest::Client,
}

impl N8nClient {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            base_url: config.n8n_api_url.clone(),
            api_key: config.n8n_api_key.clone().unwrap_or_default(),
            http_client,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, EngineError> {
        let base = self.base_url.as_deref().ok_or(EngineError::NotConfigured)?;
        let url = format!("{}/api/v1{}", base, path);
        debug!(%method, %url, "n8n request");
        Ok(self
            .http_client
            .request(method, &url)
            .header("X-N8N-API-KEY", &self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, EngineError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "n8n returned error");
            return Err(EngineError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, EngineError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WorkflowEngine for N8nClient {
    /// GET /workflows
    async fn list_workflows(&self) -> Result<Vec<EngineWorkflow>, EngineError> {
        let list: DataList<EngineWorkflow> = self.fetch("/workflows").await?;
        Ok(list.data)
    }

    /// GET /workflows/{id}
    async fn get_workflow(&self, id: &str) -> Result<Value, EngineError> {
        self.fetch(&format!("/workflows/{}", id)).await
    }

    /// POST /workflows/{id}/activate
    async fn activate(&self, id: &str) -> Result<(), EngineError> {
        let request = self.request(Method::POST, &format!("/workflows/{}/activate", id))?;
        self.send(request).await?;
        Ok(())
    }

    /// POST /workflows/{id}/deactivate
    async fn deactivate(&self, id: &str) -> Result<(), EngineError> {
        let request = self.request(Method::POST, &format!("/workflows/{}/deactivate", id))?;
        self.send(request).await?;
        Ok(())
    }

    /// POST /workflows
    async fn create_workflow(&self, body: &Value) -> Result<EngineWorkflow, EngineError> {
        let request = self.request(Method::POST, "/workflows")?.json(body);
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }

    /// GET /executions?workflowId={id}&limit={limit}
    async fn list_executions(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> Result<Vec<Execution>, EngineError> {
        let list: DataList<Execution> = self
            .fetch(&format!("/executions?workflowId={}&limit={}", workflow_id, limit))
            .await?;
        Ok(list.data)
    }
}
