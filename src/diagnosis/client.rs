//! OpenAI-compatible chat-completion client.

use futures::future::BoxFuture;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Settings;

/// Failures talking to the completion endpoint.
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("upstream reply contained no message")]
    EmptyReply,
}

/// Prompt in, reply text out.
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, DiagnosisError>>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Hosted chat-completion API (OpenRouter by default).
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("note-assistant/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true);
        if let Some(timeout) = settings.llm_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            url: settings.completions_url(),
            api_key: settings.openrouter_api_key.clone(),
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
        })
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn request(&self, prompt: &str) -> Result<String, DiagnosisError> {
        let api_key = self.api_key.as_deref().ok_or(DiagnosisError::MissingApiKey)?;
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiagnosisError::Status { status, body });
        }
        let payload: ChatCompletionResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(DiagnosisError::EmptyReply)?;
        debug!(chars = content.len(), "received completion");
        Ok(content)
    }
}

impl CompletionBackend for OpenRouterClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, DiagnosisError>> {
        Box::pin(self.request(prompt))
    }
}
