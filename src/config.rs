//! Runtime configuration utilities for note-assistant.

use std::{env, path::PathBuf, time::Duration};

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-distill-llama-70b:free";

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Credential for the OpenRouter chat-completion API.
    pub openrouter_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint.
    pub llm_base_url: String,
    /// Model identifier sent with every completion request.
    pub llm_model: String,
    /// Sampling temperature for diagnostic suggestions.
    pub llm_temperature: f32,
    /// Optional upstream request timeout in seconds.
    pub llm_timeout_secs: Option<u64>,
    /// Sentences kept by the extractive summarizer.
    pub summary_sentences: usize,
    /// Directory holding an exported token-classification model.
    pub ner_model_dir: Option<PathBuf>,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_temperature: 0.7,
            llm_timeout_secs: None,
            summary_sentences: 3,
            ner_model_dir: None,
            max_upload_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let openrouter_api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let llm_base_url = env::var("OPENROUTER_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.llm_base_url);
        let llm_model = env::var("DIAGNOSIS_MODEL").unwrap_or(defaults.llm_model);
        let llm_temperature = env::var("DIAGNOSIS_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.llm_temperature);
        let llm_timeout_secs = env::var("DIAGNOSIS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok());
        let summary_sentences = env::var("SUMMARY_SENTENCES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.summary_sentences);
        let ner_model_dir = env::var("NER_MODEL_DIR").ok().map(PathBuf::from);
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        if let Some(dir) = &ner_model_dir {
            anyhow::ensure!(
                dir.is_dir(),
                "NER_MODEL_DIR {} is not a directory",
                dir.display()
            );
        }

        Ok(Self {
            openrouter_api_key,
            llm_base_url,
            llm_model,
            llm_temperature,
            llm_timeout_secs,
            summary_sentences,
            ner_model_dir,
            max_upload_bytes,
        })
    }

    /// Upstream timeout, if one was configured.
    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }

    /// Full URL of the chat-completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.llm_base_url)
    }
}
