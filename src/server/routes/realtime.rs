//! Voice interview: realtime session creation and the end-of-call report.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{as_upstream, parse_with_llm, require_llm};
use crate::clients::{RealtimeSessionRequest, ResponseInput, ResponsesRequest};
use crate::error::{ApiError, Result, ResultExt};
use crate::interview::AgentReply;
use crate::json_text::parse_json_text;
use crate::merge::merge_structured_need;
use crate::need::StructuredNeed;
use crate::prompts::{AgentVersion, REALTIME_INSTRUCTIONS, interview_prompt};
use crate::server::AppState;
use crate::server::extract::Validate;
use crate::transcript::ChatMessage;

pub async fn realtime_session(
    State(state): State<AppState>,
) -> std::result::Result<Json<Value>, ApiError> {
    require_llm(&state)?;
    let openai = &state.config.openai;
    let request = RealtimeSessionRequest {
        model: openai.realtime_model.clone(),
        voice: openai.realtime_voice.clone(),
        modalities: vec!["text".to_string(), "audio".to_string()],
        instructions: REALTIME_INSTRUCTIONS.to_string(),
    };
    let session = state
        .llm
        .realtime_session(&request)
        .await
        .or_public("realtime-session", "Impossible de créer la session.")?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    pub transcript: Vec<ChatMessage>,
    #[serde(default)]
    pub agent_version: Option<AgentVersion>,
}

impl Validate for ReportBody {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeReport {
    pub report: StructuredNeed,
    pub agent: AgentReply,
    pub completion_id: String,
}

pub async fn realtime_report(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<RealtimeReport>, ApiError> {
    let body: ReportBody = parse_with_llm(&state, payload)?;
    let report = build_report(&state, body)
        .await
        .or_public("realtime-report", "Impossible de générer le rapport realtime.")?;
    Ok(Json(report))
}

async fn build_report(state: &AppState, body: ReportBody) -> Result<RealtimeReport> {
    let version = body.agent_version.unwrap_or_default();
    let mut input = Vec::with_capacity(body.transcript.len() + 1);
    input.push(ResponseInput::system(interview_prompt(version)));
    input.extend(body.transcript.iter().map(ResponseInput::from));

    let request = ResponsesRequest {
        model: state.config.openai.report_model(),
        input,
        reasoning_effort: Some("medium".to_string()),
        max_output_tokens: None,
    };
    let output = state.llm.responses(&request).await?;
    let agent = AgentReply::from_value(parse_json_text(&output.text)?).map_err(as_upstream)?;
    let report = merge_structured_need(&StructuredNeed::default(), agent.update_value().as_ref())
        .map_err(as_upstream)?;

    Ok(RealtimeReport {
        report,
        agent,
        completion_id: output.id,
    })
}
