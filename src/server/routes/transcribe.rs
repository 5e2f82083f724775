use axum::{Json, extract::Multipart, extract::State};
use serde_json::{Value, json};

use super::require_llm;
use crate::clients::AudioUpload;
use crate::error::{ApiError, NeedCanvasError, Result, ResultExt};
use crate::server::AppState;

const FAILURE: &str = "Impossible de transcrire l'audio.";

pub async fn transcribe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Json<Value>, ApiError> {
    require_llm(&state)?;
    let Some(audio) = audio_field(multipart)
        .await
        .or_public("transcribe", FAILURE)?
    else {
        return Err(ApiError::bad_request("Aucun fichier audio fourni."));
    };

    let openai = &state.config.openai;
    let text = state
        .llm
        .transcribe(audio, &openai.transcribe_model, &openai.transcribe_language)
        .await
        .or_public("transcribe", FAILURE)?;
    Ok(Json(json!({ "text": text })))
}

/// First multipart field named `audio`, if any.
async fn audio_field(mut multipart: Multipart) -> Result<Option<AudioUpload>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NeedCanvasError::upstream(format!("unreadable multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.webm").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| NeedCanvasError::upstream(format!("unreadable audio field: {e}")))?;
        return Ok(Some(AudioUpload {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        }));
    }
    Ok(None)
}
