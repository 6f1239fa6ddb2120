//! OpenAI-compatible chat-completions backend.

use crate::assistant::AssistantBackend;
use crate::chat::{ChatMessage, Role};
use crate::config::AppConfig;
use crate::error::AssistantError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_LIMIT: usize = 512;

pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsBackend {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|err| {
                AssistantError::Misconfiguration(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }

    /// Reads the bearer token from the environment variable named in the
    /// config.
    pub fn from_config(config: &AppConfig) -> Result<Self, AssistantError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AssistantError::Misconfiguration(format!(
                    "API key not found in environment variable '{}'",
                    config.api_key_env
                ))
            })?;

        Self::new(
            config.api_base.clone(),
            api_key,
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn request_body(&self, messages: &[ChatMessage]) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|message| WireMessage {
                    role: match message.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    }
                    .to_string(),
                    content: message.content.clone(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl AssistantBackend for ChatCompletionsBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        debug!(model = %self.model, messages = messages.len(), "invoking chat completions");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|err| AssistantError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: CompletionResponse = response.json().await.map_err(|err| {
            AssistantError::Transport(format!("failed to parse completion response: {err}"))
        })?;
        extract_content(body)
    }
}

fn extract_content(body: CompletionResponse) -> Result<String, AssistantError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.is_empty())
        .ok_or(AssistantError::EmptyResponse)
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
