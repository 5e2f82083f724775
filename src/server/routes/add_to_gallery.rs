use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::timestamp;
use crate::error::{ApiError, Result, ResultExt};
use crate::server::AppState;
use crate::server::extract::{ValidJson, Validate};

pub const ADDED_MESSAGE: &str = "Canevas ajouté à la galerie ! Vous pourrez voter prochainement.";

/// The canvas is relayed as given; edited canvases may carry extra keys.
#[derive(Debug, Deserialize)]
pub struct AddToGalleryBody {
    pub canvas: Value,
}

impl Validate for AddToGalleryBody {
    fn validate(&self) -> Vec<(String, String)> {
        if self.canvas.is_object() {
            Vec::new()
        } else {
            vec![("canvas".to_string(), "Expected object".to_string())]
        }
    }
}

pub async fn add_to_gallery(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<AddToGalleryBody>,
) -> std::result::Result<Json<Value>, ApiError> {
    publish(&state, body.canvas)
        .await
        .or_public("add-to-gallery", "Impossible d'ajouter à la galerie.")?;
    Ok(Json(json!({ "success": true, "message": ADDED_MESSAGE })))
}

async fn publish(state: &AppState, canvas: Value) -> Result<()> {
    let outbound = json!({
        "type": "add-to-gallery",
        "canvas": canvas,
        "addedAt": timestamp(),
    });
    state
        .webhooks
        .post_json(&state.config.webhooks.add_gallery, &outbound)
        .await?
        .ensure_success("add-to-gallery")?;
    Ok(())
}
