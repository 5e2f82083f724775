//! reqwest implementation of [`LlmClient`] against an OpenAI-compatible API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::traits::{
    AudioUpload, ChatCompletion, ChatRequest, InputRole, LlmClient, RealtimeSessionRequest,
    ResponsesOutput, ResponsesRequest,
};
use crate::error::{NeedCanvasError, Result};

pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build reqwest client with timeout")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| NeedCanvasError::MissingApiKey {
                name: "OPENAI_API_KEY".to_string(),
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send_json(&self, path: &str, body: &Value, beta: Option<&str>) -> Result<Value> {
        let mut req = self
            .client
            .post(self.url(path))
            .bearer_auth(self.key()?)
            .json(body);
        if let Some(beta) = beta {
            req = req.header("OpenAI-Beta", beta);
        }
        let resp = req.send().await?;
        read_json(resp, path).await
    }
}

async fn read_json(resp: reqwest::Response, path: &str) -> Result<Value> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(NeedCanvasError::upstream(format!(
            "OpenAI {path} error {status}: {text}"
        )));
    }
    resp.json::<Value>()
        .await
        .map_err(|e| NeedCanvasError::upstream(format!("OpenAI {path} returned invalid JSON: {e}")))
}

/// Chat completions request body.
pub fn chat_body(request: &ChatRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": request.messages,
    });
    if let Some(t) = request.temperature {
        body["temperature"] = json!(t);
    }
    if let Some(max) = request.max_tokens {
        body["max_tokens"] = json!(max);
    }
    if request.json_mode {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

fn input_text(role: &str, text: &str) -> Value {
    json!({
        "role": role,
        "content": [{ "type": "input_text", "text": text }],
    })
}

/// Responses API request body. Assistant turns are replayed as completed output messages.
pub fn responses_body(request: &ResponsesRequest) -> Value {
    let input: Vec<Value> = request
        .input
        .iter()
        .enumerate()
        .map(|(idx, item)| match item.role {
            InputRole::Assistant => json!({
                "id": format!("msg_recap_{idx}"),
                "role": "assistant",
                "status": "completed",
                "type": "message",
                "content": [{ "type": "output_text", "text": item.text, "annotations": [] }],
            }),
            InputRole::System => input_text("system", &item.text),
            InputRole::User => input_text("user", &item.text),
        })
        .collect();

    let mut body = json!({
        "model": request.model,
        "input": input,
    });
    if let Some(effort) = &request.reasoning_effort {
        body["reasoning"] = json!({ "effort": effort });
    }
    if let Some(max) = request.max_output_tokens {
        body["max_output_tokens"] = json!(max);
    }
    body
}

/// First `output_text` across all output items, `"{}"` when there is none.
pub fn first_output_text(response: &Value) -> String {
    response
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .find(|c| c.get("type").and_then(Value::as_str) == Some("output_text"))
        .and_then(|c| c.get("text").and_then(Value::as_str))
        .unwrap_or("{}")
        .to_string()
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        debug!(
            "OpenAI chat completion (model={}, messages={})",
            request.model,
            request.messages.len()
        );
        let v = self
            .send_json("chat/completions", &chat_body(request), None)
            .await?;
        Ok(ChatCompletion {
            id: v["id"].as_str().map(str::to_string),
            content: v["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or("{}")
                .to_string(),
        })
    }

    async fn responses(&self, request: &ResponsesRequest) -> Result<ResponsesOutput> {
        debug!(
            "OpenAI responses (model={}, items={})",
            request.model,
            request.input.len()
        );
        let v = self
            .send_json("responses", &responses_body(request), None)
            .await?;
        Ok(ResponsesOutput {
            id: v["id"].as_str().unwrap_or_default().to_string(),
            text: first_output_text(&v),
        })
    }

    async fn realtime_session(&self, request: &RealtimeSessionRequest) -> Result<Value> {
        let body = serde_json::to_value(request)?;
        self.send_json("realtime/sessions", &body, Some("realtime=v1"))
            .await
    }

    async fn transcribe(&self, audio: AudioUpload, model: &str, language: &str) -> Result<String> {
        debug!(
            "OpenAI transcription (model={}, bytes={})",
            model,
            audio.bytes.len()
        );
        let mut part = multipart::Part::bytes(audio.bytes).file_name(audio.file_name);
        if let Some(mime) = audio.content_type {
            part = part.mime_str(&mime)?;
        }
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string())
            .text("language", language.to_string());

        let resp = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(self.key()?)
            .multipart(form)
            .send()
            .await?;
        let v = read_json(resp, "audio/transcriptions").await?;
        v.get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NeedCanvasError::upstream("transcription response has no text"))
    }
}
