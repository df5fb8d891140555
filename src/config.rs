//! Configuration module - Environment-based configuration
//!
//! Every credential is optional: a missing one degrades its feature to an
//! empty or error result instead of stopping the process.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::agent::anthropic::AnthropicProvider;
use crate::agent::openai::OpenAiProvider;
use crate::agent::provider::{ChatProvider, ProviderKind};
use crate::n8n::{N8nClient, WorkflowEngine};
use crate::registry::WorkflowRegistry;
use crate::report::{GoogleDocsClient, ReportSource};
use crate::sheets::{GoogleSheetsClient, SheetSource};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server config
    pub host: String,
    pub port: u16,

    // Workflow engine
    pub n8n_api_url: Option<String>,
    pub n8n_api_key: Option<String>,

    // LLM vendors
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,

    // Google sheets / docs
    pub google_service_account_email: Option<String>,
    pub google_private_key: Option<String>,
    pub customer_sheet_id: Option<String>,
    pub content_sheet_id: Option<String>,
    pub sheet_range: String,
    pub report_doc_id: Option<String>,

    // Behaviour
    pub http_timeout_secs: u64,
    pub max_tool_rounds: usize,
    pub workflow_registry_path: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            n8n_api_url: non_empty("N8N_API_URL").map(|u| u.trim_end_matches('/').to_string()),
            n8n_api_key: non_empty("N8N_API_KEY"),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-6".to_string()),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            google_service_account_email: non_empty("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            // Keys pasted into .env files usually carry literal "\n" sequences
            google_private_key: non_empty("GOOGLE_PRIVATE_KEY").map(|k| k.replace("\\n", "\n")),
            customer_sheet_id: non_empty("CUSTOMER_SHEET_ID"),
            content_sheet_id: non_empty("CONTENT_SHEET_ID"),
            sheet_range: env::var("SHEET_RANGE").unwrap_or_else(|_| "Sheet1".to_string()),
            report_doc_id: non_empty("REPORT_DOC_ID"),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            max_tool_rounds: env::var("MAX_TOOL_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(8),
            workflow_registry_path: non_empty("WORKFLOW_REGISTRY_PATH"),
        }
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Registry from `WORKFLOW_REGISTRY_PATH`, or the built-in four automations.
    pub fn load_registry(&self) -> WorkflowRegistry {
        match &self.workflow_registry_path {
            Some(path) => WorkflowRegistry::from_file(path).unwrap_or_else(|e| {
                warn!("{:#}; using built-in workflow registry", e);
                WorkflowRegistry::default()
            }),
            None => WorkflowRegistry::default(),
        }
    }
}

impl Default for Config {
    /// Nothing configured; every external feature degrades.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            n8n_api_url: None,
            n8n_api_key: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-6".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            google_service_account_email: None,
            google_private_key: None,
            customer_sheet_id: None,
            content_sheet_id: None,
            sheet_range: "Sheet1".to_string(),
            report_doc_id: None,
            http_timeout_secs: 30,
            max_tool_rounds: 8,
            workflow_registry_path: None,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<WorkflowRegistry>,
    pub engine: Arc<dyn WorkflowEngine>,
    pub sheets: Arc<dyn SheetSource>,
    pub report: Arc<dyn ReportSource>,
    pub anthropic: Arc<dyn ChatProvider>,
    pub openai: Arc<dyn ChatProvider>,
}

impl AppState {
    /// Wire the real HTTP-backed clients. Every client shares one
    /// `reqwest::Client` carrying the outbound timeout.
    pub fn new(config: Config) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout ({}); using defaults", e);
                reqwest::Client::new()
            });

        let registry = Arc::new(config.load_registry());
        let config = Arc::new(config);

        Self {
            engine: Arc::new(N8nClient::new(&config, http_client.clone())),
            sheets: Arc::new(GoogleSheetsClient::new(&config, http_client.clone())),
            report: Arc::new(GoogleDocsClient::new(&config, http_client.clone())),
            anthropic: Arc::new(AnthropicProvider::new(&config, http_client.clone())),
            openai: Arc::new(OpenAiProvider::new(&config, http_client)),
            registry,
            config,
        }
    }

    pub fn provider(&self, kind: ProviderKind) -> Arc<dyn ChatProvider> {
        match kind {
            ProviderKind::Anthropic => Arc::clone(&self.anthropic),
            ProviderKind::OpenAi => Arc::clone(&self.openai),
        }
    }
}
