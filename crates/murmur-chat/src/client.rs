use crate::error::ChatError;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// Default bounded wait for the completion call.
const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(45);

/// Configuration for the completion client.
#[derive(Clone)]
pub struct CompletionConfig {
    /// Provider base URL. Overridable so tests can point at a local mock.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Bounded wait for the whole call (send, status check, body read).
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            model: "claude-3-opus-20240229".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A completion produced by the provider: the first content text plus the
/// raw payload, which callers forward unchanged.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub payload: Value,
}

/// Client for the completion provider's messages endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Requests a completion for `message`, passing `system` through as the
    /// model's system instruction when present.
    ///
    /// The entire exchange is raced against the configured bound; if the
    /// timer wins, the call's eventual outcome is discarded and
    /// [`ChatError::Timeout`] is returned.
    pub async fn complete(
        &self,
        message: &str,
        system: Option<&str>,
    ) -> Result<Completion, ChatError> {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{"role": "user", "content": message}],
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }

        let call = async {
            let resp = self
                .http
                .post(format!("{}/v1/messages", self.config.base_url))
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ChatError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            let payload: Value = resp.json().await?;
            extract_completion(payload)
        };

        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ChatError::Timeout(self.config.timeout)),
        }
    }
}

/// Extracts the first content text from a provider payload.
///
/// Fails with [`ChatError::MalformedPayload`] when the content list is
/// empty or its first entry carries no text.
pub fn extract_completion(payload: Value) -> Result<Completion, ChatError> {
    let text = payload["content"][0]["text"]
        .as_str()
        .ok_or_else(|| {
            ChatError::MalformedPayload("no text in first content entry".to_string())
        })?
        .to_string();

    Ok(Completion { text, payload })
}
