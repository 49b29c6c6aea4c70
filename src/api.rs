//! LLM API interaction over an OpenAI-compatible chat-completions endpoint.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction. The summarizer is
//!   generic over it, so tests can substitute an in-process double.
//! - [`DeepSeekClient`]: Sends one prompt to `POST {base_url}/chat/completions`
//!   and returns the first choice's message content.
//!
//! A failed call is not retried. It surfaces as an [`LlmError`] and the
//! summarizer records it in the report.

use crate::error::LlmError;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to a language model and return its answer.
/// The returned future must be `Send` so calls can run on spawned tasks.
pub trait AskAsync: Send + Sync {
    /// Send `prompt` to the model and receive its text answer.
    fn ask(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Settings for [`DeepSeekClient`].
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmSettings {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            max_tokens: 600,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Chat-completions client for DeepSeek or any OpenAI-compatible provider.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl DeepSeekClient {
    pub fn new(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

impl AskAsync for DeepSeekClient {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        let t0 = Instant::now();
        let body = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let err = LlmError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&text, 500),
            };
            warn!(elapsed_ms = t0.elapsed().as_millis(), error = %err, "LLM call rejected");
            return Err(err);
        }

        let parsed: ChatResponse = resp.json().await.map_err(LlmError::Decode)?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(LlmError::EmptyChoices)?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            answer_bytes = answer.len(),
            "LLM call succeeded"
        );
        Ok(answer)
    }
}
