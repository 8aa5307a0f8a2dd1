use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use simfit_core::config::{LlmConfig, LlmProvider};
use tracing::warn;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 400;
const RETRY_BACKOFF_MS: u64 = 250;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat/completion client for the configured hosted or local provider.
#[derive(Clone, Debug)]
pub struct HttpLlmClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;
        let base_url = config
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| default_base_url(config.provider).to_string());
        Ok(Self {
            client,
            provider: config.provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn endpoint(&self) -> String {
        match self.provider {
            LlmProvider::OpenAi => format!("{}/chat/completions", self.base_url),
            LlmProvider::Anthropic => format!("{}/messages", self.base_url),
            LlmProvider::Ollama => format!("{}/api/generate", self.base_url),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, body: &Value) -> Result<RequestBuilder> {
        let builder = self.client.post(self.endpoint()).json(body);
        let builder = match self.provider {
            LlmProvider::OpenAi => builder.bearer_auth(self.api_key()?),
            LlmProvider::Anthropic => builder
                .header("x-api-key", self.api_key()?)
                .header("anthropic-version", ANTHROPIC_VERSION),
            LlmProvider::Ollama => builder,
        };
        Ok(builder)
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("llm api key is not configured"))
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => OPENAI_BASE_URL,
        LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        LlmProvider::Ollama => OLLAMA_BASE_URL,
    }
}

pub fn request_body(provider: LlmProvider, model: &str, prompt: &str) -> Value {
    match provider {
        LlmProvider::OpenAi => json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.4,
            "response_format": { "type": "json_object" },
        }),
        LlmProvider::Anthropic => json!({
            "model": model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        }),
        LlmProvider::Ollama => json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        }),
    }
}

/// Pull the generated text out of a provider response.
pub fn extract_text(provider: LlmProvider, payload: &Value) -> Option<String> {
    let text = match provider {
        LlmProvider::OpenAi => payload.pointer("/choices/0/message/content")?.as_str(),
        LlmProvider::Anthropic => payload
            .get("content")?
            .as_array()?
            .iter()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
            .get("text")?
            .as_str(),
        LlmProvider::Ollama => payload.get("response")?.as_str(),
    }?;
    Some(text.to_string())
}

fn retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl HttpLlmClient {
    /// POST `body` to the provider endpoint, retrying transient failures.
    pub(crate) async fn send(&self, body: &Value) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.request(body)?.send().await;
            let retry_reason = match outcome {
                Ok(response) if response.status().is_success() => {
                    let payload: Value =
                        response.json().await.context("failed to decode llm response")?;
                    return extract_text(self.provider, &payload)
                        .ok_or_else(|| anyhow!("llm response did not contain any text"));
                }
                Ok(response) if retryable(response.status()) => {
                    format!("llm endpoint returned {}", response.status())
                }
                Ok(response) => bail!("llm endpoint returned {}", response.status()),
                Err(error) => format!("llm request failed: {error}"),
            };

            if attempt > self.max_retries {
                bail!("{retry_reason} (after {attempt} attempts)");
            }
            warn!(
                event_name = "agent.llm.retry",
                provider = ?self.provider,
                attempt,
                reason = %retry_reason,
                "retrying llm request"
            );
            tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt))).await;
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.send(&request_body(self.provider, &self.model, prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use simfit_core::config::{AppConfig, LlmProvider};

    use super::{extract_text, request_body, HttpLlmClient};

    #[test]
    fn endpoints_follow_provider_conventions() {
        let mut config = AppConfig::default().llm;
        config.base_url = Some("http://llm.local/".to_string());

        let ollama = HttpLlmClient::from_config(&config).expect("client");
        assert_eq!(ollama.endpoint(), "http://llm.local/api/generate");

        config.provider = LlmProvider::OpenAi;
        config.base_url = None;
        let openai = HttpLlmClient::from_config(&config).expect("client");
        assert_eq!(openai.endpoint(), "https://api.openai.com/v1/chat/completions");

        config.provider = LlmProvider::Anthropic;
        let anthropic = HttpLlmClient::from_config(&config).expect("client");
        assert_eq!(anthropic.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn request_bodies_carry_model_and_prompt() {
        let body = request_body(LlmProvider::Anthropic, "claude-x", "hello");
        assert_eq!(body["model"], "claude-x");
        assert_eq!(body["messages"][0]["content"], "hello");

        let body = request_body(LlmProvider::Ollama, "llama3.1", "hello");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn text_is_extracted_per_provider() {
        let openai = json!({"choices": [{"message": {"content": "a"}}]});
        let anthropic = json!({"content": [{"type": "tool_use"}, {"type": "text", "text": "b"}]});
        let ollama = json!({"response": "c"});

        assert_eq!(extract_text(LlmProvider::OpenAi, &openai).as_deref(), Some("a"));
        assert_eq!(extract_text(LlmProvider::Anthropic, &anthropic).as_deref(), Some("b"));
        assert_eq!(extract_text(LlmProvider::Ollama, &ollama).as_deref(), Some("c"));
        assert_eq!(extract_text(LlmProvider::Ollama, &openai), None);
    }
}
