use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::timestamp;
use crate::error::{ApiError, Result, ResultExt};
use crate::server::AppState;
use crate::server::extract::{ValidJson, Validate};
use crate::transcript::ChatMessage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeBody {
    /// Relayed verbatim, unknown keys included.
    pub structured_need: Value,
    #[serde(default)]
    pub transcript: Option<Vec<ChatMessage>>,
    /// Accepted for compatibility; delivery is the workflow's job.
    #[serde(default)]
    pub recipient_email: Option<String>,
}

impl Validate for FinalizeBody {
    fn validate(&self) -> Vec<(String, String)> {
        if self.structured_need.is_object() {
            Vec::new()
        } else {
            vec![("structuredNeed".to_string(), "Expected object".to_string())]
        }
    }
}

pub async fn finalize(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<FinalizeBody>,
) -> std::result::Result<Json<Value>, ApiError> {
    submit(&state, &body)
        .await
        .or_public("finalize", "Échec de la finalisation")?;
    Ok(Json(json!({ "ok": true })))
}

async fn submit(state: &AppState, body: &FinalizeBody) -> Result<()> {
    let mut outbound = json!({
        "type": "bms-agentic-need",
        "capturedAt": timestamp(),
        "structuredNeed": body.structured_need,
    });
    if let Some(transcript) = &body.transcript {
        outbound["transcript"] = serde_json::to_value(transcript)?;
    }
    state
        .webhooks
        .post_json(&state.config.webhooks.finalize, &outbound)
        .await?
        .ensure_success("finalize")?;
    info!(
        recipient = body.recipient_email.as_deref().unwrap_or("-"),
        "structured need submitted"
    );
    Ok(())
}
