use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{as_upstream, parse_with_llm};
use crate::clients::{ChatRequest, LlmMessage, ResponseInput, ResponsesRequest};
use crate::config::is_reasoning_model;
use crate::error::{ApiError, NeedCanvasError, Result, ResultExt};
use crate::json_text::parse_json_text;
use crate::merge::merge_structured_need;
use crate::need::StructuredNeed;
use crate::prompts::{NORMALIZATION_PROMPT, normalization_user_message};
use crate::server::AppState;
use crate::server::extract::Validate;
use crate::transcript::{ChatMessage, recent, transcript_text};

/// Messages kept from the end of the transcript.
const TRANSCRIPT_WINDOW: usize = 20;
const MAX_OUTPUT_TOKENS: u32 = 1500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeBody {
    pub structured_need: StructuredNeed,
    pub transcript: Vec<ChatMessage>,
}

impl Validate for NormalizeBody {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizerAnswer {
    normalized_update: Map<String, Value>,
    summary: String,
    is_complete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResult {
    pub normalized_need: StructuredNeed,
    pub summary: String,
    pub is_complete: bool,
}

pub async fn normalize(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<NormalizeResult>, ApiError> {
    let body: NormalizeBody = parse_with_llm(&state, payload)?;
    let result = run(&state, body)
        .await
        .or_public("normalize", "Impossible de normaliser le use case.")?;
    Ok(Json(result))
}

async fn run(state: &AppState, body: NormalizeBody) -> Result<NormalizeResult> {
    let transcript = transcript_text(recent(&body.transcript, TRANSCRIPT_WINDOW));
    let need_json = serde_json::to_string(&body.structured_need)?;
    let user_message = normalization_user_message(&transcript, &need_json);

    let model = state.config.openai.normalize_model();
    debug!(model = %model, "normalizing structured need");
    let raw = if is_reasoning_model(&model) {
        let request = ResponsesRequest {
            model,
            input: vec![
                ResponseInput::system(NORMALIZATION_PROMPT),
                ResponseInput::user(user_message),
            ],
            reasoning_effort: Some("none".to_string()),
            max_output_tokens: Some(MAX_OUTPUT_TOKENS),
        };
        state.llm.responses(&request).await?.text
    } else {
        let request = ChatRequest {
            model,
            messages: vec![
                LlmMessage::system(NORMALIZATION_PROMPT),
                LlmMessage::user(user_message),
            ],
            temperature: Some(0.3),
            max_tokens: Some(MAX_OUTPUT_TOKENS),
            json_mode: true,
        };
        state.llm.chat_completion(&request).await?.content
    };

    let answer: NormalizerAnswer =
        serde_json::from_value(parse_json_text(&raw)?).map_err(|e| {
            NeedCanvasError::upstream(format!("normalizer answer has the wrong shape: {e}"))
        })?;
    let update = Value::Object(answer.normalized_update);
    let normalized_need =
        merge_structured_need(&body.structured_need, Some(&update)).map_err(as_upstream)?;

    Ok(NormalizeResult {
        normalized_need,
        summary: answer.summary,
        is_complete: answer.is_complete,
    })
}
