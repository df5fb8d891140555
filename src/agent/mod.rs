//! Conversational operations assistant
//!
//! One request drives a two-state loop: wait for the model, then, if it asked
//! for tools, run them all concurrently and feed the results back. The loop
//! ends on a text reply or when the round ceiling is hit.

pub mod anthropic;
pub mod openai;
pub mod plain;
pub mod prompt;
pub mod provider;
pub mod tools;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::AppState;
use crate::error::AgentError;
use crate::n8n::WorkflowEngine;
use crate::registry::WorkflowRegistry;
use crate::types::{ChatMessage, Role};

use self::plain::plain_language;
use self::prompt::system_prompt;
use self::provider::{ChatProvider, Completion, CompletionRequest, ToolResult, Turn};
use self::tools::{tool_specs, ToolExecutor};

/// Output token budget per model round.
pub const MAX_TOKENS: u32 = 1024;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        match message.role {
            Role::User => Turn::User(message.content.clone()),
            Role::Assistant => Turn::Assistant(message.content.clone()),
        }
    }
}

pub struct Agent {
    engine: Arc<dyn WorkflowEngine>,
    registry: Arc<WorkflowRegistry>,
    max_rounds: usize,
}

impl Agent {
    pub fn new(engine: Arc<dyn WorkflowEngine>, registry: Arc<WorkflowRegistry>, max_rounds: usize) -> Self {
        Self {
            engine,
            registry,
            max_rounds,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.engine),
            Arc::clone(&state.registry),
            state.config.max_tool_rounds,
        )
    }

    /// Produce one plain-language reply to `transcript`.
    ///
    /// Vendor failures end the turn with an error; tool failures are handed
    /// back to the model as `{"error": ...}` results.
    pub async fn converse(
        &self,
        provider: &dyn ChatProvider,
        transcript: &[ChatMessage],
    ) -> Result<String, AgentError> {
        let system = system_prompt(&self.registry);
        let tools = tool_specs();
        let executor = ToolExecutor::new(self.engine.as_ref(), &self.registry);
        let executor = &executor;

        let mut turns: Vec<Turn> = transcript.iter().map(Turn::from).collect();
        let mut rounds = 0;

        loop {
            let request = CompletionRequest {
                system: &system,
                tools: &tools,
                turns: &turns,
                max_tokens: MAX_TOKENS,
            };

            match provider.complete(&request).await? {
                Completion::Text(text) => {
                    let reply = text
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                    info!(rounds, "assistant replied");
                    return Ok(plain_language(&reply));
                }
                Completion::ToolCalls { text, calls } => {
                    if rounds >= self.max_rounds {
                        warn!(rounds, "assistant exceeded tool round limit");
                        return Err(AgentError::TooManyRounds(self.max_rounds));
                    }
                    rounds += 1;
                    debug!(round = rounds, calls = calls.len(), "running tool calls");

                    let results: Vec<ToolResult> = join_all(calls.iter().map(|call| async move {
                        ToolResult {
                            call_id: call.id.clone(),
                            content: executor.execute(call).await,
                        }
                    }))
                    .await;

                    turns.push(Turn::ToolCalls { text, calls });
                    turns.push(Turn::ToolResults(results));
                }
            }
        }
    }
}
