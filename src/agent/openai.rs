//! OpenAI Chat Completions binding
//!
//! POST {base}/v1/chat/completions. The system instruction is the first
//! message; tool results go back as one `role: tool` message per call.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::agent::provider::{ChatProvider, Completion, CompletionRequest, ToolCall, Turn};
use crate::config::Config;
use crate::error::ProviderError;

const PROVIDER: &str = "openai";

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }
}

fn push_wire_messages(turn: &Turn, out: &mut Vec<Value>) {
    match turn {
        Turn::User(text) => out.push(json!({"role": "user", "content": text})),
        Turn::Assistant(text) => out.push(json!({"role": "assistant", "content": text})),
        Turn::ToolCalls { text, calls } => {
            let tool_calls: Vec<Value> = calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": {"name": c.name, "arguments": c.input.to_string()},
                    })
                })
                .collect();
            out.push(json!({"role": "assistant", "content": text, "tool_calls": tool_calls}));
        }
        Turn::ToolResults(results) => out.extend(results.iter().map(|r| {
            json!({"role": "tool", "tool_call_id": r.call_id, "content": r.content})
        })),
    }
}

/// Request body for `/v1/chat/completions`.
pub fn request_body(model: &str, request: &CompletionRequest<'_>) -> Value {
    let mut messages = vec![json!({"role": "system", "content": request.system})];
    for turn in request.turns {
        push_wire_messages(turn, &mut messages);
    }

    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {"name": t.name, "description": t.description, "parameters": t.parameters},
            })
        })
        .collect();

    json!({
        "model": model,
        "max_tokens": request.max_tokens,
        "tools": tools,
        "messages": messages,
    })
}

/// Arguments arrive as a JSON string; unparseable text is kept as a string
/// so typed tool validation rejects it.
fn parse_arguments(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn into_completion(response: ChatCompletionResponse) -> Result<Completion, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Decode {
            provider: PROVIDER,
            message: "response has no choices".to_string(),
        })?;

    let calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            input: parse_arguments(tc.function.arguments),
        })
        .collect();
    let text = choice.message.content.filter(|t| !t.is_empty());

    if choice.finish_reason.as_deref() == Some("tool_calls") && !calls.is_empty() {
        Ok(Completion::ToolCalls { text, calls })
    } else {
        Ok(Completion::Text(text))
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(model = %self.model, turns = request.turns.len(), "openai request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
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
            warn!(status = %status, %body, "openai returned error");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        into_completion(parsed)
    }
}
