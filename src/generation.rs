//! Generation capability: prompt in, answer text out.
//!
//! Two providers, both speaking the OpenAI chat-completions wire format:
//! - **[`OpenAiChat`]** — `api.openai.com`, credential `OPENAI_API_KEY`.
//! - **[`GroqChat`]** — Groq's OpenAI-compatible endpoint, credential
//!   `GROQ_API_KEY`.
//!
//! Provider selection is a closed configuration enum
//! ([`Provider`](crate::config::Provider)); [`create_chat_model`] verifies
//! the credential up front so a missing key fails before any pipeline
//! work starts. Retry policy matches the embedding client: backoff on
//! 429/5xx/network errors, fail fast on other 4xx.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{GenerationConfig, Provider};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Trait for chat-model backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Generate an answer for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Chat model served by the OpenAI API.
pub struct OpenAiChat {
    client: ChatCompletionsClient,
}

/// Chat model served by Groq's OpenAI-compatible API.
pub struct GroqChat {
    client: ChatCompletionsClient,
}

impl OpenAiChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: ChatCompletionsClient::new(OPENAI_BASE_URL, Provider::OpenAi, config)?,
        })
    }
}

impl GroqChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: ChatCompletionsClient::new(GROQ_BASE_URL, Provider::Groq, config)?,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.client.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.complete(prompt).await
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    fn model_name(&self) -> &str {
        &self.client.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.complete(prompt).await
    }
}

/// Create the configured chat model.
///
/// # Errors
///
/// Returns an error when the selected provider's credential environment
/// variable is unset — a hard precondition, reported before any capture
/// processing begins.
pub fn create_chat_model(config: &GenerationConfig) -> Result<Box<dyn ChatModel>> {
    match config.provider {
        Provider::OpenAi => Ok(Box::new(OpenAiChat::new(config)?)),
        Provider::Groq => Ok(Box::new(GroqChat::new(config)?)),
    }
}

/// Shared chat-completions wire client. Both providers differ only in
/// base URL and credential variable.
struct ChatCompletionsClient {
    base_url: &'static str,
    model: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    fn new(base_url: &'static str, provider: Provider, config: &GenerationConfig) -> Result<Self> {
        let var = provider.credential_var();
        let api_key =
            std::env::var(var).map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "chat completions error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("chat completions error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    if let Some(err) = json.get("error") {
        let msg = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        bail!("API error: {}", msg);
    }

    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))
}
