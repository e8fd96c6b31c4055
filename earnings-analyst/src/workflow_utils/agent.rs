//! Claude agent backend with stream handling

use async_trait::async_trait;
use claude_agent_sdk::{query, ClaudeAgentOptions, ContentBlock, Message};
use earnings_analyst_sdk::{
    log_model_complete, log_model_failed, log_model_message, log_model_start,
};
use futures::{Stream, StreamExt};

use super::model::{ModelClient, ModelError, ModelRequest};

/// [`ModelClient`] that drives the Claude agent SDK for a single text turn
pub struct ClaudeAgentClient {
    model: String,
    debug: bool,
}

impl ClaudeAgentClient {
    /// `model` labels log events and snapshots; the agent runs whatever
    /// model the local Claude CLI is configured with
    pub fn new(model: impl Into<String>, debug: bool) -> Self {
        Self {
            model: model.into(),
            debug,
        }
    }

    /// One turn under the default permission mode, so a tool request ends
    /// the conversation instead of running
    fn options(&self, request: &ModelRequest) -> ClaudeAgentOptions {
        let system_prompt = request.system_prompt.clone().unwrap_or_else(|| {
            format!(
                "Respond with a single JSON object for the `{}` record.",
                request.shape.name
            )
        });

        ClaudeAgentOptions::builder()
            .system_prompt(system_prompt)
            .max_turns(1)
            .build()
    }
}

#[async_trait]
impl ModelClient for ClaudeAgentClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        log_model_start!(
            &request.task_id,
            &self.model,
            format!("Requesting {}", request.shape.name)
        );

        let options = self.options(&request);
        let stream = query(&request.prompt, Some(options)).await.map_err(|e| {
            log_model_failed!(&request.task_id, &self.model, e.to_string());
            ModelError::Transport(e.to_string())
        })?;

        match handle_stream(stream, &request.task_id, &self.model, self.debug).await {
            Ok(response) => {
                log_model_complete!(
                    &request.task_id,
                    &self.model,
                    format!("{} chars", response.len())
                );
                Ok(response)
            }
            Err(e) => {
                log_model_failed!(&request.task_id, &self.model, e.to_string());
                Err(e)
            }
        }
    }
}

/// What the collector needs from one stream message
#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamEvent {
    Text(String),
    Finished { is_error: bool },
    Ignored,
}

fn stream_events(message: Message) -> Vec<StreamEvent> {
    match message {
        Message::Assistant { message, .. } => message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(StreamEvent::Text(text)),
                _ => None,
            })
            .collect(),
        Message::Result { is_error, .. } => vec![StreamEvent::Finished { is_error }],
        _ => vec![StreamEvent::Ignored],
    }
}

/// Accumulates assistant text until the result message arrives
#[derive(Debug, Default)]
struct ResponseCollector {
    text: String,
}

impl ResponseCollector {
    /// Returns `Ok(true)` once the conversation has ended
    fn push(&mut self, event: StreamEvent) -> Result<bool, ModelError> {
        match event {
            StreamEvent::Text(text) => {
                self.text.push_str(&text);
                Ok(false)
            }
            StreamEvent::Finished { is_error: true } => Err(agent_error(&self.text)),
            StreamEvent::Finished { is_error: false } => Ok(true),
            StreamEvent::Ignored => Ok(false),
        }
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Classify the text of a failed conversation
fn agent_error(text: &str) -> ModelError {
    let message = if text.trim().is_empty() {
        "agent reported an error".to_string()
    } else {
        text.trim().to_string()
    };
    let lower = message.to_lowercase();

    if ["api key", "authentication", "unauthorized", "/login", "401"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        ModelError::Authentication(message)
    } else if ["rate limit", "rate_limit", "429"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        ModelError::RateLimited(message)
    } else {
        ModelError::Transport(message)
    }
}

/// Collect assistant text blocks until the result message arrives.
///
/// A result flagged as an error fails the call. Text is forwarded as model
/// message events only in debug mode.
async fn handle_stream(
    stream: impl Stream<Item = claude_agent_sdk::error::Result<Message>>,
    task_id: &str,
    model: &str,
    debug: bool,
) -> Result<String, ModelError> {
    let mut collector = ResponseCollector::default();
    let mut stream = Box::pin(stream);

    'messages: while let Some(message) = stream.next().await {
        let message = message.map_err(|e| ModelError::Transport(e.to_string()))?;
        for event in stream_events(message) {
            if let (true, StreamEvent::Text(text)) = (debug, &event) {
                log_model_message!(task_id, model, text);
            }
            if collector.push(event)? {
                break 'messages;
            }
        }
    }

    Ok(collector.finish())
}
