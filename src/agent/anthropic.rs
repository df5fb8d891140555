//! Anthropic Messages API binding
//!
//! POST {base}/v1/messages. Tool calls arrive as `tool_use` content blocks;
//! results go back as a user message of `tool_result` blocks.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::agent::provider::{ChatProvider, Completion, CompletionRequest, ToolCall, Turn};
use crate::config::Config;
use crate::error::ProviderError;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

pub struct AnthropicProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            api_key: config.anthropic_api_key.clone(),
            model: config.anthropic_model.clone(),
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }
}

fn wire_message(turn: &Turn) -> Value {
    match turn {
        Turn::User(text) => json!({"role": "user", "content": text}),
        Turn::Assistant(text) => json!({"role": "assistant", "content": text}),
        Turn::ToolCalls { text, calls } => {
            let mut blocks: Vec<Value> = text
                .iter()
                .map(|t| json!({"type": "text", "text": t}))
                .collect();
            blocks.extend(calls.iter().map(|c| {
                json!({"type": "tool_use", "id": c.id, "name": c.name, "input": c.input})
            }));
            json!({"role": "assistant", "content": blocks})
        }
        Turn::ToolResults(results) => {
            let blocks: Vec<Value> = results
                .iter()
                .map(|r| json!({"type": "tool_result", "tool_use_id": r.call_id, "content": r.content}))
                .collect();
            json!({"role": "user", "content": blocks})
        }
    }
}

/// Request body for `/v1/messages`.
pub fn request_body(model: &str, request: &CompletionRequest<'_>) -> Value {
    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|t| json!({"name": t.name, "description": t.description, "input_schema": t.parameters}))
        .collect();

    json!({
        "model": model,
        "max_tokens": request.max_tokens,
        "system": request.system,
        "tools": tools,
        "messages": request.turns.iter().map(wire_message).collect::<Vec<_>>(),
    })
}

fn into_completion(response: MessagesResponse) -> Completion {
    let mut text = None;
    let mut calls = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text: t } if text.is_none() => text = Some(t),
            ContentBlock::ToolUse { id, name, input } => calls.push(ToolCall { id, name, input }),
            _ => {}
        }
    }

    if response.stop_reason.as_deref() == Some("tool_use") && !calls.is_empty() {
        Completion::ToolCalls { text, calls }
    } else {
        Completion::Text(text)
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = %self.model, turns = request.turns.len(), "anthropic request");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body(&self.model, request))
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, %body, "anthropic returned error");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        Ok(into_completion(parsed))
    }
}
