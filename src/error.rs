//! Error types for every outbound boundary and for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors from the workflow engine REST API.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("workflow engine is not configured")]
    NotConfigured,

    #[error("n8n API error: {status}")]
    Status { status: u16 },

    #[error("workflow engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected workflow engine response: {0}")]
    Decode(String),
}

/// Errors from the Google-hosted sheet and document sources.
#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("Google credentials not configured")]
    NotConfigured,

    #[error("Google auth failed: {0}")]
    Auth(String),

    #[error("Google key could not be used: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("Google API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Google request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from an LLM vendor.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} API key is not configured")]
    NotConfigured(&'static str),

    #[error("{provider} API error {status}")]
    Api {
        provider: &'static str,
        status: u16,
        /// Logged where it is received; kept out of the message.
        body: String,
    },

    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

/// Errors raised while dispatching a single tool call.
///
/// These never escape the orchestration loop; they are encoded as
/// `{"error": ...}` and handed back to the model.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {message}")]
    InvalidInput { tool: String, message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors that end a chat turn without a reply.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("assistant did not finish after {0} rounds of tool use")]
    TooManyRounds(usize),
}

/// Errors returned by HTTP handlers, rendered as the `{success, error}` envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<GoogleError> for ApiError {
    fn from(e: GoogleError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}
