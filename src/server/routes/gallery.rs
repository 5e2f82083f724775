use axum::{
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::deserializers::de_option_string_forgiving;
use crate::error::{ApiError, Result};
use crate::gallery::{GalleryEntry, entry_from_row, rows_from_payload};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct GalleryList {
    pub canvases: Vec<GalleryEntry>,
}

pub async fn list_gallery(
    State(state): State<AppState>,
) -> std::result::Result<Json<GalleryList>, ApiError> {
    match fetch_entries(&state).await {
        Ok(canvases) => Ok(Json(GalleryList { canvases })),
        Err(e) => {
            error!(route = "gallery", error = %e, "request failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Impossible de récupérer la galerie.", "canvases": [] }),
            ))
        }
    }
}

async fn fetch_entries(state: &AppState) -> Result<Vec<GalleryEntry>> {
    let resp = state
        .webhooks
        .get(&state.config.webhooks.get_gallery, &[])
        .await?
        .ensure_success("gallery")?;
    let rows = rows_from_payload(resp.json()?);
    debug!(rows = rows.len(), "gallery rows fetched");
    Ok(rows.iter().map(entry_from_row).collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    #[serde(default, deserialize_with = "de_option_string_forgiving")]
    pub canvas_id: Option<String>,
    #[serde(default, deserialize_with = "de_option_string_forgiving")]
    pub voter_email: Option<String>,
}

pub async fn vote(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let body = payload
        .ok()
        .and_then(|Json(v)| serde_json::from_value::<VoteBody>(v).ok())
        .unwrap_or_default();
    let (Some(canvas_id), Some(voter_email)) = (body.canvas_id, body.voter_email) else {
        return Err(ApiError::bad_request("canvasId et voterEmail requis"));
    };

    let outbound = json!({ "email": voter_email, "id": canvas_id });
    let resp = match state
        .webhooks
        .post_json(&state.config.webhooks.vote, &outbound)
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            error!(route = "gallery-vote", error = %e, "request failed");
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Impossible d'enregistrer le vote.", "details": e.to_string() }),
            ));
        }
    };

    if !resp.is_success() {
        error!(route = "gallery-vote", status = resp.status, "vote webhook refused");
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": format!("Erreur webhook n8n: {}", resp.status),
                "details": resp.body,
            }),
        ));
    }

    info!(canvas_id = %canvas_id, "vote recorded");
    Ok(Json(json!({ "success": true, "data": resp.json_opt() })))
}
