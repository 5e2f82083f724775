use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::Value;

use super::{as_upstream, parse_with_llm};
use crate::clients::{ChatRequest, LlmMessage};
use crate::error::{ApiError, Result, ResultExt};
use crate::interview::{AgentPhase, AgentReply};
use crate::json_text::parse_json_text;
use crate::prompts::interview_prompt_v1;
use crate::server::AppState;
use crate::server::extract::Validate;
use crate::transcript::ChatMessage;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub phase: Option<AgentPhase>,
}

impl Validate for ChatBody {}

pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<AgentReply>, ApiError> {
    let body: ChatBody = parse_with_llm(&state, payload)?;
    let reply = ask_interviewer(&state, body)
        .await
        .or_public("chat", "Impossible d'interroger OpenAI.")?;
    Ok(Json(reply))
}

async fn ask_interviewer(state: &AppState, body: ChatBody) -> Result<AgentReply> {
    let mut messages = Vec::with_capacity(body.messages.len() + 1);
    messages.push(LlmMessage::system(interview_prompt_v1()));
    messages.extend(body.messages.iter().map(LlmMessage::from));

    let request = ChatRequest {
        model: state.config.openai.model_for_phase(body.phase),
        messages,
        temperature: Some(0.2),
        max_tokens: None,
        json_mode: true,
    };
    let completion = state.llm.chat_completion(&request).await?;
    AgentReply::from_value(parse_json_text(&completion.content)?).map_err(as_upstream)
}
