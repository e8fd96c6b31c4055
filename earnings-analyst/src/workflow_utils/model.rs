//! Model client boundary
//!
//! Every stage talks to a language model through [`ModelClient`]. The
//! orchestrator only needs the raw response text back; anything else the
//! backend does (streaming, retries, tool policy) stays behind the trait.

use async_trait::async_trait;
use thiserror::Error;

/// Hint describing the record a stage expects back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputShape {
    /// Record name, e.g. `research_plan`
    pub name: String,
    /// Top-level keys the record must carry
    pub required_keys: Vec<String>,
}

impl OutputShape {
    pub fn new(name: impl Into<String>, required_keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            required_keys: required_keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// One model invocation
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Used to correlate log events for this call
    pub task_id: String,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub shape: OutputShape,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Map a non-success HTTP status to a [`ModelError`]
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> ModelError {
    match status {
        401 => ModelError::Authentication(format!("{}: invalid API key", provider)),
        403 => ModelError::Authentication(format!("{}: access denied", provider)),
        429 => ModelError::RateLimited(format!("{}: {}", provider, body)),
        _ => ModelError::Api {
            status,
            message: format!("{}: {}", provider, body),
        },
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Label recorded in logs and snapshot metadata
    fn name(&self) -> &str;

    /// Send one request and return the full response text
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError>;
}
