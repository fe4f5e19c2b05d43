//! Language model provider abstraction and implementations.
//!
//! Defines the [`LanguageModel`] trait (prompt in, text completion out)
//! and concrete implementations:
//! - **[`DisabledProvider`]**: always fails; used when no provider is configured.
//! - **[`OpenAiProvider`]**: calls an OpenAI-compatible `/chat/completions` endpoint.
//! - **[`OllamaProvider`]**: calls a local Ollama instance's `/api/generate` endpoint.
//!
//! Completions carry no guaranteed structure; see [`crate::parse`] for
//! turning them into fields.
//!
//! # Retry Strategy
//!
//! HTTP providers retry transient failures with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProviderConfig;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Failure talking to a provider. The analyzer catches these and degrades.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("language model provider is disabled")]
    Disabled,
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("provider response contained no completion text")]
    EmptyResponse,
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

/// A hosted or local model that completes prompts.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short identifier for logs (e.g. `"openai:gpt-4o-mini"`).
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str) -> Result<Completion, ProviderError>;
}

/// Run `provider.invoke` but give up after `timeout`.
pub async fn invoke_with_timeout(
    provider: &dyn LanguageModel,
    prompt: &str,
    timeout: Duration,
) -> Result<Completion, ProviderError> {
    match tokio::time::timeout(timeout, provider.invoke(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}

/// Instantiate the provider named by `config.kind`.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.kind.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown provider kind: {}", other),
    }
}

// ============ Disabled Provider ============

/// A provider that refuses every prompt.
pub struct DisabledProvider;

#[async_trait]
impl LanguageModel for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn invoke(&self, _prompt: &str) -> Result<Completion, ProviderError> {
        Err(ProviderError::Disabled)
    }
}

// ============ OpenAI Provider ============

/// Provider for the OpenAI chat-completions API (or any compatible gateway).
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiProvider {
    client: reqwest::Client,
    name: String,
    model: String,
    url: String,
    api_key: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiProvider {
    /// # Errors
    ///
    /// Returns an error if `model` is not set in config or
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("provider.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingApiKey("OPENAI_API_KEY"))?;
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_DEFAULT_URL)
            .trim_end_matches('/');

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            name: format!("openai:{}", model),
            url: format!("{}/chat/completions", base),
            model,
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });
        let json = post_json_with_retry(
            &self.client,
            &self.url,
            Some(&self.api_key),
            &body,
            self.max_retries,
        )
        .await?;
        parse_openai_completion(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_openai_completion(json: &Value) -> Result<Completion, ProviderError> {
    json.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| Completion {
            content: s.to_string(),
        })
        .ok_or(ProviderError::EmptyResponse)
}

// ============ Ollama Provider ============

/// Provider backed by a local Ollama instance.
///
/// Calls `POST /api/generate` on the configured URL (default: `http://localhost:11434`).
pub struct OllamaProvider {
    client: reqwest::Client,
    name: String,
    model: String,
    url: String,
    temperature: f32,
    max_retries: u32,
}

impl OllamaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("provider.model required for Ollama provider"))?;
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
            .trim_end_matches('/');

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            name: format!("ollama:{}", model),
            url: format!("{}/api/generate", base),
            model,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        let json =
            post_json_with_retry(&self.client, &self.url, None, &body, self.max_retries).await?;
        parse_ollama_completion(&json)
    }
}

fn parse_ollama_completion(json: &Value) -> Result<Completion, ProviderError> {
    json.get("response")
        .and_then(Value::as_str)
        .map(|s| Completion {
            content: s.to_string(),
        })
        .ok_or(ProviderError::EmptyResponse)
}

// ============ HTTP plumbing ============

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST a JSON body, retrying rate limits, server errors, and network failures.
async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    max_retries: u32,
) -> Result<Value, ProviderError> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(url, attempt, ?delay, "retrying provider request");
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).json(body);
        if let Some(key) = bearer {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                let err = ProviderError::Api {
                    status: status.as_u16(),
                    body: body_text,
                };

                // rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    warn!(url, status = status.as_u16(), attempt, "provider request failed");
                    last_err = Some(err);
                    continue;
                }

                return Err(err);
            }
            Err(e) => {
                warn!(url, attempt, error = %e, "provider request failed");
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or(ProviderError::EmptyResponse))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait]
    impl LanguageModel for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn invoke(&self, _prompt: &str) -> Result<Completion, ProviderError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Completion {
                content: "late".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_disabled_provider_refuses() {
        let err = DisabledProvider.invoke("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Disabled));
    }

    #[tokio::test]
    async fn test_timeout_wraps_slow_provider() {
        let err = invoke_with_timeout(&SlowProvider, "hi", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_timeout_passes_through_fast_result() {
        let err = invoke_with_timeout(&DisabledProvider, "hi", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Disabled));
    }

    #[test]
    fn test_create_disabled_provider() {
        let provider = create_provider(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "disabled");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = ProviderConfig {
            kind: "magic".to_string(),
            ..ProviderConfig::default()
        };
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_ollama_provider_urls() {
        let config = ProviderConfig {
            kind: "ollama".to_string(),
            model: Some("llama3".to_string()),
            base_url: Some("http://gpu-box:11434/".to_string()),
            ..ProviderConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.url, "http://gpu-box:11434/api/generate");
        assert_eq!(provider.name(), "ollama:llama3");
    }

    #[test]
    fn test_parse_openai_completion() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        assert_eq!(parse_openai_completion(&json).unwrap().content, "hello");
        assert!(matches!(
            parse_openai_completion(&json!({ "choices": [] })),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_ollama_completion() {
        let json = json!({ "model": "llama3", "response": "{\"keywords\": []}", "done": true });
        assert_eq!(
            parse_ollama_completion(&json).unwrap().content,
            "{\"keywords\": []}"
        );
        assert!(parse_ollama_completion(&json!({})).is_err());
    }
}
