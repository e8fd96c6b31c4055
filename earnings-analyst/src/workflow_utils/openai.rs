//! OpenAI-compatible chat completions backend

use async_trait::async_trait;
use earnings_analyst_sdk::{
    log_model_complete, log_model_failed, log_model_message, log_model_start,
};
use serde::Deserialize;

use super::model::{parse_http_error, ModelClient, ModelError, ModelRequest};

/// Default chat completions endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    debug: bool,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, debug: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            debug,
        }
    }

    /// Point at a compatible endpoint instead of api.openai.com
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request_body(&self, request: &ModelRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "response_format": {"type": "json_object"},
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Text of the first choice; a `null` content is an empty reply
fn parse_response(body: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("no choices in response".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        log_model_start!(
            &request.task_id,
            &self.model,
            format!("Requesting {}", request.shape.name)
        );

        let result = async {
            let response = self
                .client
                .post(&self.base_url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&self.build_request_body(&request))
                .send()
                .await
                .map_err(|e| ModelError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ModelError::Transport(e.to_string()))?;

            if !(200..300).contains(&status) {
                return Err(parse_http_error(status, &body, "openai"));
            }

            parse_response(&body)
        }
        .await;

        match &result {
            Ok(text) => {
                if self.debug {
                    log_model_message!(&request.task_id, &self.model, text);
                }
                log_model_complete!(&request.task_id, &self.model, format!("{} chars", text.len()));
            }
            Err(e) => {
                log_model_failed!(&request.task_id, &self.model, e.to_string());
            }
        }

        result
    }
}
