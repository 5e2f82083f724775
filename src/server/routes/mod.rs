//! One module per proxied endpoint.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::AppState;
use super::extract::{Validate, parse_payload};
use crate::error::{ApiError, NeedCanvasError};

pub mod add_to_gallery;
pub mod canvas_normalize;
pub mod chat;
pub mod chat_webhook;
pub mod classify;
pub mod finalize;
pub mod gallery;
pub mod health;
pub mod legacy;
pub mod normalize;
pub mod realtime;
pub mod template_agent;
pub mod transcribe;

/// Missing API key wins over a bad payload on model-backed routes.
pub(crate) fn require_llm(state: &AppState) -> Result<(), ApiError> {
    if state.llm.is_configured() {
        Ok(())
    } else {
        Err(NeedCanvasError::MissingApiKey {
            name: "OPENAI_API_KEY".to_string(),
        }
        .into())
    }
}

/// [`require_llm`] then [`parse_payload`].
pub(crate) fn parse_with_llm<T>(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    require_llm(state)?;
    parse_payload(payload)
}

/// Millisecond UTC timestamp stamped on outbound webhook payloads.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A malformed upstream answer is a downstream failure, never the caller's 400.
pub(crate) fn as_upstream(err: NeedCanvasError) -> NeedCanvasError {
    match err {
        NeedCanvasError::Validation { message, details } => {
            NeedCanvasError::upstream(format!("{message}: {details}"))
        }
        other => other,
    }
}
