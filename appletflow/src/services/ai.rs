use crate::app::AiCfg;
use crate::errors::AppletflowError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AiMessage {
    pub role: AiRole,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        AiMessage {
            role: AiRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        AiMessage {
            role: AiRole::User,
            content: content.into(),
        }
    }
}

/// One-shot text completion over an ordered list of messages.
#[allow(async_fn_in_trait)]
pub trait Completion {
    async fn complete(&self, messages: &[AiMessage]) -> Result<String, AppletflowError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [AiMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// OpenRouter chat completions client.
pub struct OpenRouterClient {
    http: reqwest::Client,
    cfg: AiCfg,
}

impl OpenRouterClient {
    pub fn new(cfg: &AiCfg) -> Result<Self, AppletflowError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppletflowError::ConfigError(format!("Failed to build AI http client: {}", e)))?;

        if cfg.api_key().is_none() {
            log::warn!("AI API key not found. Set OPENROUTER_API_KEY or ai.api_key");
        }

        Ok(OpenRouterClient { http, cfg: cfg.clone() })
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

impl Completion for OpenRouterClient {
    async fn complete(&self, messages: &[AiMessage]) -> Result<String, AppletflowError> {
        let api_key = self
            .cfg
            .api_key()
            .ok_or_else(|| AppletflowError::AiError("API key not configured".to_string()))?;

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.cfg.referer)
            .header("X-Title", &self.cfg.title)
            .json(&ChatRequest {
                model: &self.cfg.model,
                messages,
                temperature: self.cfg.temperature,
                max_tokens: self.cfg.max_tokens,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                log::error!("Error sending AI request: {:?}", e);
                AppletflowError::AiError(format!("Error sending AI request: {}", e))
            })?;

        let status = response.status();
        let body = response.json::<Value>().await;

        if !status.is_success() {
            let body = body.unwrap_or(Value::Null);

            return Err(AppletflowError::AiError(error_message(&body, status.as_u16())));
        }

        let body = body.map_err(|e| {
            log::error!("Error parsing AI response: {:?}", e);
            AppletflowError::AiError("Invalid response format from AI service".to_string())
        })?;

        completion_content(&body)
    }
}

/// `error.message` of a failed completion, else `HTTP {status}`.
pub fn error_message(body: &Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// `choices[0].message.content` of a completion envelope.
pub fn completion_content(body: &Value) -> Result<String, AppletflowError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppletflowError::AiError("Invalid response format from AI service".to_string()))
}
