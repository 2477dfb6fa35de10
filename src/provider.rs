//! External model provider client.
//!
//! The orchestrator talks to the provider through the `ModelProvider` trait
//! so tests can substitute a scripted implementation. The production
//! implementation posts to the OpenAI chat-completions API and parses the
//! returned message content as a single JSON object. Exactly one attempt is
//! made per request; persistent failure surfaces immediately rather than
//! being retried or queued.

use serde_json::Value;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned malformed output: {0}")]
    MalformedOutput(String),
}

/// Black-box analysis collaborator: fixed instruction plus a JSON payload
/// in, a JSON object out, or an error.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    async fn complete(&self, instruction: &str, payload: &Value) -> Result<Value, ProviderError>;
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout_ms: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    async fn complete(&self, instruction: &str, payload: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": instruction },
                { "role": "user", "content": payload.to_string() },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedOutput(format!("non-JSON response: {}", e)))?;
        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::MalformedOutput("missing choices[0].message.content".into())
            })?;
        serde_json::from_str(content)
            .map_err(|e| ProviderError::MalformedOutput(format!("content is not JSON: {}", e)))
    }
}
