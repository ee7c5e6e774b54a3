//! Client for the analysis model served behind an OpenAI-compatible endpoint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Configuration for the remote annotator
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the serving endpoint
    pub endpoint_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Upper bound on generated tokens; raised for long sentences
    pub max_tokens: usize,
    /// Temperature for sampling
    pub temperature: f64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint_url: std::env::var("LEXIDE_ENDPOINT_URL")
                .unwrap_or_else(|_| "https://your-modal-endpoint.modal.run".to_string()),
            model: "lexide-gemma-3-27b".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
        }
    }
}

impl RemoteConfig {
    /// Room for roughly eight output tokens per input character.
    pub(crate) fn token_budget(&self, sentence: &str) -> usize {
        self.max_tokens.max(10 + 8 * sentence.len())
    }
}

pub struct RemoteClient {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600)) // cold starts can be slow
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Send one prompt and return the raw completion text.
    pub async fn generate(&self, prompt: &str, sentence: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.token_budget(sentence),
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Remote endpoint returned error {}: {}", status, error_text);
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse response from remote endpoint")?;

        Ok(chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}
