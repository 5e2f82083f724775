use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::timestamp;
use crate::error::{ApiError, Result, ResultExt};
use crate::json_text::{is_truthy, parse_json_text};
use crate::server::AppState;
use crate::server::extract::{ValidJson, Validate};
use crate::transcript::{ChatMessage, transcript_text};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNormalizeBody {
    /// Relayed verbatim, unknown keys included.
    pub structured_need: Value,
    pub transcript: Vec<ChatMessage>,
    pub canvas_id: String,
}

impl Validate for CanvasNormalizeBody {
    fn validate(&self) -> Vec<(String, String)> {
        if self.structured_need.is_object() {
            Vec::new()
        } else {
            vec![("structuredNeed".to_string(), "Expected object".to_string())]
        }
    }
}

pub async fn canvas_normalize(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CanvasNormalizeBody>,
) -> std::result::Result<Json<Value>, ApiError> {
    let (canvas, update) = request_normalization(&state, &body)
        .await
        .or_public("canvas-normalize", "Impossible de normaliser le canevas via n8n.")?;
    Ok(Json(json!({
        "success": true,
        "normalizedCanvas": canvas,
        "structuredNeedUpdate": update,
    })))
}

async fn request_normalization(
    state: &AppState,
    body: &CanvasNormalizeBody,
) -> Result<(Value, Value)> {
    let outbound = json!({
        "type": "canvas-normalization-request",
        "canvasId": body.canvas_id,
        "transcriptText": transcript_text(&body.transcript),
        "structuredNeed": body.structured_need,
        "requestedAt": timestamp(),
    });
    let resp = state
        .webhooks
        .post_json(&state.config.webhooks.canvas_normalize, &outbound)
        .await?
        .ensure_success("canvas-normalize")?;
    split_answer(resp.json()?)
}

/// Accepts `[{output: "<json>"}]`, `{normalizedCanvas, structuredNeedUpdate}`,
/// or any other JSON taken as the canvas itself.
fn split_answer(raw: Value) -> Result<(Value, Value)> {
    let stringified = raw
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("output"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(output) = stringified {
        return Ok(parts(parse_json_text(&output)?));
    }

    if raw.get("normalizedCanvas").is_some_and(is_truthy) {
        return Ok(parts(raw));
    }

    Ok((raw, json!({})))
}

fn parts(mut value: Value) -> (Value, Value) {
    let mut take = |key: &str| {
        value
            .as_object_mut()
            .and_then(|obj| obj.remove(key))
            .unwrap_or(Value::Null)
    };
    let canvas = take("normalizedCanvas");
    let update = take("structuredNeedUpdate");
    (canvas, update)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringified_output_is_parsed() {
        let raw = json!([{ "output": "```json\n{\"normalizedCanvas\":{\"id\":\"c1\"},\"structuredNeedUpdate\":{\"summaryNote\":\"x\"}}\n```" }]);
        let (canvas, update) = split_answer(raw).unwrap();
        assert_eq!(canvas["id"], "c1");
        assert_eq!(update["summaryNote"], "x");
    }

    #[test]
    fn test_direct_shape() {
        let (canvas, update) =
            split_answer(json!({ "normalizedCanvas": { "id": "c2" } })).unwrap();
        assert_eq!(canvas["id"], "c2");
        assert!(update.is_null());
    }

    #[test]
    fn test_anything_else_is_the_canvas() {
        let (canvas, update) = split_answer(json!({ "id": "c3" })).unwrap();
        assert_eq!(canvas, json!({ "id": "c3" }));
        assert_eq!(update, json!({}));
    }
}
