use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, NeedCanvasError, Result, ResultExt};
use crate::json_text::unwrap_envelope;
use crate::server::AppState;

/// Forwards the body verbatim to the chat workflow and unwraps its answer.
pub async fn chat_webhook(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    const FAILURE: &str = "Impossible de contacter n8n ou de parser la réponse.";
    let Json(payload) = payload.map_err(|rejection| {
        tracing::error!(route = "chat-webhook", error = %rejection.body_text(), "unreadable body");
        ApiError::internal(FAILURE)
    })?;
    let data = relay(&state, &payload)
        .await
        .or_public("chat-webhook", FAILURE)?;
    Ok(Json(data))
}

async fn relay(state: &AppState, payload: &Value) -> Result<Value> {
    let url = &state.config.webhooks.chat;
    debug!(url = %url, "forwarding chat turn to workflow");
    let resp = state
        .webhooks
        .post_json(url, payload)
        .await?
        .ensure_success("chat")?;
    let data = unwrap_envelope(resp.json()?)?;
    ensure_agent_shape(&data)?;
    Ok(data)
}

fn ensure_agent_shape(data: &Value) -> Result<()> {
    let missing: Vec<&str> = ["reply", "phase", "status"]
        .into_iter()
        .filter(|key| {
            !data
                .get(*key)
                .and_then(Value::as_str)
                .is_some_and(|v| !v.is_empty())
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(NeedCanvasError::upstream(format!(
            "invalid workflow answer, missing {}",
            missing.join(", ")
        )))
    }
}
