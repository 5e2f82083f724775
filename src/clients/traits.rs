use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NeedCanvasError, Result};
use crate::transcript::{ChatMessage, Role};

/// One chat-completions message; `role` also allows `system`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for LlmMessage {
    fn from(m: &ChatMessage) -> Self {
        Self {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Sets `response_format = json_object`
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub id: Option<String>,
    /// First choice content, `"{}"` when the model returned none
    pub content: String,
}

/// Speaker of a Responses API input item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInput {
    pub role: InputRole,
    pub text: String,
}

impl ResponseInput {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: InputRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: InputRole::User,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for ResponseInput {
    fn from(m: &ChatMessage) -> Self {
        Self {
            role: match m.role {
                Role::User => InputRole::User,
                Role::Assistant => InputRole::Assistant,
            },
            text: m.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<ResponseInput>,
    pub reasoning_effort: Option<String>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponsesOutput {
    pub id: String,
    /// First `output_text` item, `"{}"` when absent
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeSessionRequest {
    pub model: String,
    pub voice: String,
    pub modalities: Vec<String>,
    pub instructions: String,
}

#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Language model API: chat, responses, realtime sessions and transcription.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// False when no API key is configured; every call would fail.
    fn is_configured(&self) -> bool;

    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatCompletion>;

    async fn responses(&self, request: &ResponsesRequest) -> Result<ResponsesOutput>;

    /// Returns the upstream session object untouched.
    async fn realtime_session(&self, request: &RealtimeSessionRequest) -> Result<Value>;

    async fn transcribe(&self, audio: AudioUpload, model: &str, language: &str) -> Result<String>;
}

/// Raw webhook answer. Non-2xx statuses are not errors at this level.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails on a non-2xx status, keeping a prefix of the body for the log.
    pub fn ensure_success(self, what: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            let excerpt: String = self.body.chars().take(200).collect();
            Err(NeedCanvasError::upstream(format!(
                "{what} webhook error: {} - {excerpt}",
                self.status
            )))
        }
    }

    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| NeedCanvasError::Serialization {
            message: format!("webhook body is not JSON: {e}"),
        })
    }

    /// `None` for an empty or non-JSON body.
    pub fn json_opt(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&self.body).ok()
        }
    }
}

/// Workflow engine endpoints reached over HTTP.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<WebhookResponse>;

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<WebhookResponse>;
}
