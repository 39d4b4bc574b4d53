//! Client for the content-drafting assistant API.
//!
//! The tool layer treats the assistant as an opaque text source: it sends a
//! prompt and only needs the text that comes back. Transport and API
//! failures surface as `ToolError::Upstream`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::debug;

use focal_core::config::{AssistantConfig, AssistantProvider};
use focal_core::errors::ToolError;

#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ToolError>;
}

pub struct HttpAssistantClient {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl HttpAssistantClient {
    pub fn new(config: AssistantConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ToolError::Upstream(format!("could not build http client: {error}")))?;

        Ok(Self { client, config })
    }

    fn request(&self, prompt: &str) -> Result<reqwest::RequestBuilder, ToolError> {
        match self.config.provider {
            AssistantProvider::OpenAi => {
                let base = self.config.base_url.as_deref().unwrap_or("https://api.openai.com");
                let api_key = self.api_key()?;
                Ok(self
                    .client
                    .post(format!("{base}/v1/chat/completions"))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "model": self.config.model,
                        "messages": [{"role": "user", "content": prompt}],
                    })))
            }
            AssistantProvider::Anthropic => {
                let base = self.config.base_url.as_deref().unwrap_or("https://api.anthropic.com");
                let api_key = self.api_key()?;
                Ok(self
                    .client
                    .post(format!("{base}/v1/messages"))
                    .header("x-api-key", api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&json!({
                        "model": self.config.model,
                        "max_tokens": 2048,
                        "messages": [{"role": "user", "content": prompt}],
                    })))
            }
            AssistantProvider::Ollama => {
                let base = self
                    .config
                    .base_url
                    .as_deref()
                    .ok_or_else(|| ToolError::Upstream("assistant base_url is not set".to_string()))?;
                Ok(self.client.post(format!("{base}/api/generate")).json(&json!({
                    "model": self.config.model,
                    "prompt": prompt,
                    "stream": false,
                })))
            }
        }
    }

    fn api_key(&self) -> Result<String, ToolError> {
        self.config
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().to_string())
            .ok_or_else(|| ToolError::Upstream("assistant api_key is not set".to_string()))
    }

    fn extract_text(&self, body: &Value) -> Option<String> {
        match self.config.provider {
            AssistantProvider::OpenAi => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string),
            AssistantProvider::Anthropic => {
                body.pointer("/content/0/text").and_then(Value::as_str).map(str::to_string)
            }
            AssistantProvider::Ollama => {
                body.get("response").and_then(Value::as_str).map(str::to_string)
            }
        }
    }
}

#[async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn complete(&self, prompt: &str) -> Result<String, ToolError> {
        let mut last_error = ToolError::Upstream("assistant request was never attempted".to_string());

        for attempt in 0..=self.config.max_retries {
            debug!(
                event_name = "agent.assistant.request",
                attempt,
                model = %self.config.model,
                "sending assistant completion request"
            );

            let response = match self.request(prompt)?.send().await {
                Ok(response) => response,
                Err(error) => {
                    last_error =
                        ToolError::Upstream(format!("assistant request failed: {error}"));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                last_error = ToolError::Upstream(format!(
                    "assistant responded with status {status}"
                ));
                if status.is_client_error() {
                    break;
                }
                continue;
            }

            let body = response.json::<Value>().await.map_err(|error| {
                ToolError::Upstream(format!("assistant response was not JSON: {error}"))
            })?;

            return self.extract_text(&body).ok_or_else(|| {
                ToolError::Upstream("assistant response held no text content".to_string())
            });
        }

        Err(last_error)
    }
}
