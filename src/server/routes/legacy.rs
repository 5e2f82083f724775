//! Session-backed interview kept for the first campaign's clients.
//!
//! The whole state tree lives server-side; each turn the model returns an
//! `updated_state` that is overlaid positionally on the stored one.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::clients::{ChatRequest, LlmMessage};
use crate::json_text::{is_truthy, strip_code_fences};
use crate::merge::replace_recursive;
use crate::notify::summarize_for_email;
use crate::prompts::LEGACY_INTERVIEW_PROMPT;
use crate::server::AppState;
use crate::session::{
    default_legacy_state, new_session_id, session_cookie, session_id_from_headers, utc_now_iso,
};

pub const RESET_MESSAGE: &str = "Entretien réinitialisé.";
pub const FALLBACK_QUESTION: &str = "Pouvez-vous préciser ?";

/// Model verdict for one turn, with the loose defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTurn {
    pub assistant_message: String,
    pub updated_state: Option<Value>,
    pub complete: bool,
}

impl LegacyTurn {
    pub fn from_content(content: &str) -> Self {
        let parsed: Value =
            serde_json::from_str(strip_code_fences(content)).unwrap_or(Value::Null);
        let assistant_message = match parsed.get("assistant_message") {
            None | Some(Value::Null) => FALLBACK_QUESTION.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let updated_state = parsed
            .get("updated_state")
            .filter(|v| v.is_object() || v.is_array())
            .cloned();
        let complete = parsed.get("complete").is_some_and(is_truthy);
        Self {
            assistant_message,
            updated_state,
            complete,
        }
    }
}

pub async fn legacy_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let session_id = session_id_from_headers(&headers).unwrap_or_else(new_session_id);
    let cookie = [(header::SET_COOKIE, session_cookie(&session_id))];

    let reset = input.get("reset").filter(|v| !v.is_null());
    let mut current = match state.sessions.get(&session_id).await {
        Some(existing) if !reset.is_some_and(is_truthy) => existing,
        _ => default_legacy_state(),
    };
    state.sessions.put(session_id.clone(), current.clone()).await;

    if reset.is_some() {
        return (
            cookie,
            Json(json!({ "state": current, "assistant_message": RESET_MESSAGE })),
        )
            .into_response();
    }

    let user_message = match input.get("message") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let request = ChatRequest {
        model: state.config.openai.legacy_model(),
        messages: vec![
            LlmMessage::system(LEGACY_INTERVIEW_PROMPT),
            LlmMessage::user(
                json!({ "user_message": user_message, "current_state": current }).to_string(),
            ),
        ],
        temperature: Some(0.3),
        max_tokens: None,
        json_mode: true,
    };
    let completion = match state.llm.chat_completion(&request).await {
        Ok(completion) => completion,
        Err(e) => {
            warn!(route = "legacy", error = %e, "interview model unavailable");
            return (
                cookie,
                Json(json!({
                    "error": true,
                    "message": "OpenAI indisponible",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let turn = LegacyTurn::from_content(&completion.content);
    if let Some(update) = &turn.updated_state {
        replace_recursive(&mut current, update);
    }
    apply_completion(&mut current, turn.complete);
    state.sessions.put(session_id, current.clone()).await;

    if turn.complete {
        deliver(&state, &current).await;
    }

    (
        cookie,
        Json(json!({
            "assistant_message": turn.assistant_message,
            "state": current,
            "complete": turn.complete,
        })),
    )
        .into_response()
}

/// Sets `complete` and stamps `meta.timestamp_end` the first time it turns true.
pub fn apply_completion(state: &mut Value, complete: bool) {
    let Some(obj) = state.as_object_mut() else {
        return;
    };
    obj.insert("complete".to_string(), Value::Bool(complete));
    if !complete {
        return;
    }
    let meta = obj.entry("meta").or_insert_with(|| json!({}));
    if let Some(meta) = meta.as_object_mut() {
        let stamped = meta.get("timestamp_end").is_some_and(is_truthy);
        if !stamped {
            meta.insert("timestamp_end".to_string(), Value::String(utc_now_iso()));
        }
    }
}

/// Webhook and recap email for a finished interview. Failures are only logged.
async fn deliver(state: &AppState, interview: &Value) {
    let interview_id = interview
        .pointer("/meta/interview_id")
        .cloned()
        .unwrap_or(Value::Null);

    if let Some(url) = &state.config.webhooks.legacy {
        let outbound = json!({
            "source": "bms-agentic-needs",
            "interview_id": interview_id,
            "state": interview,
        });
        match state.webhooks.post_json(url, &outbound).await {
            Ok(resp) if resp.is_success() => {
                info!(interview_id = %interview_id, "legacy interview delivered")
            }
            Ok(resp) => warn!(status = resp.status, "legacy webhook refused the interview"),
            Err(e) => warn!(error = %e, "legacy webhook unreachable"),
        }
    }

    if let (Some(notifier), Some(to)) = (&state.notifier, &state.config.notify.email) {
        let html = summarize_for_email(interview);
        if let Err(e) = notifier
            .send_summary(to, &state.config.notify.subject, &html)
            .await
        {
            warn!(error = %e, "recap email not sent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_defaults_on_garbage() {
        let turn = LegacyTurn::from_content("not json");
        assert_eq!(turn.assistant_message, FALLBACK_QUESTION);
        assert!(turn.updated_state.is_none());
        assert!(!turn.complete);
    }

    #[test]
    fn test_turn_ignores_scalar_state() {
        let turn = LegacyTurn::from_content(
            r#"{"assistant_message":"Merci","updated_state":"oops","complete":true}"#,
        );
        assert_eq!(turn.assistant_message, "Merci");
        assert!(turn.updated_state.is_none());
        assert!(turn.complete);
    }

    #[test]
    fn test_end_timestamp_set_once() {
        let mut state = json!({
            "meta": { "timestamp_end": "2025-01-01T00:00:00Z" },
            "complete": false
        });
        apply_completion(&mut state, true);
        assert_eq!(state["meta"]["timestamp_end"], "2025-01-01T00:00:00Z");
        assert_eq!(state["complete"], json!(true));

        let mut fresh = json!({ "meta": {} });
        apply_completion(&mut fresh, true);
        assert!(fresh["meta"]["timestamp_end"].is_string());

        let mut open = json!({ "meta": {} });
        apply_completion(&mut open, false);
        assert!(open["meta"].get("timestamp_end").is_none());
    }
}
