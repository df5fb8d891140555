//! Vendor-neutral conversation shape and the provider seam
//!
//! The orchestrator only ever speaks in these types; each vendor binding
//! translates them to and from its own wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Vendor-assigned id; results are matched back by it.
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    /// JSON text, either the tool's output or `{"error": ...}`.
    pub content: String,
}

/// One entry of the working transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Assistant(String),
    /// Assistant response that asked for tools, with any text it carried.
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    ToolResults(Vec<ToolResult>),
}

/// Tool advertised to the model; `parameters` is a JSON Schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub tools: &'a [ToolSpec],
    pub turns: &'a [Turn],
    pub max_tokens: u32,
}

/// What one model round produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Finished; the first text segment if there was one.
    Text(Option<String>),
    /// More tools requested.
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// `"openai"` selects OpenAI; anything else, including nothing, is Anthropic.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("openai") => ProviderKind::OpenAi,
            _ => ProviderKind::Anthropic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}
