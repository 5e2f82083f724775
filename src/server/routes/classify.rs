//! Batch classification of gallery agents by business domain.

use axum::{Json, extract::State};
use futures_util::{StreamExt, future, stream};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::timestamp;
use crate::clients::{ChatRequest, LlmMessage};
use crate::error::{ApiError, Result, ResultExt};
use crate::gallery::{Row, agent_description, agent_name, row_strategic_score, rows_from_payload};
use crate::prompts::{UNCLASSIFIED, classification_prompt, classification_user_message};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub success: bool,
    pub classified: usize,
    pub total: usize,
}

pub async fn classify(
    State(state): State<AppState>,
) -> std::result::Result<Json<ClassifyReport>, ApiError> {
    let rows = fetch_rows(&state)
        .await
        .or_public("admin-classify", "Erreur lors de la classification")?;
    let total = rows.len();
    let named: Vec<Row> = rows
        .into_iter()
        .filter(|row| agent_name(row).is_some())
        .collect();

    let concurrency = state.config.server.classify_concurrency.max(1);
    let classified = stream::iter(named)
        .map(|row| {
            let state = state.clone();
            async move { classify_row(&state, &row).await }
        })
        .buffer_unordered(concurrency)
        .fold(0usize, |n, stored| future::ready(n + usize::from(stored)))
        .await;

    info!(classified, total, "gallery classification finished");
    Ok(Json(ClassifyReport {
        success: true,
        classified,
        total,
    }))
}

async fn fetch_rows(state: &AppState) -> Result<Vec<Row>> {
    let resp = state
        .webhooks
        .get(&state.config.webhooks.get_gallery, &[])
        .await?
        .ensure_success("gallery")?;
    Ok(rows_from_payload(resp.json()?))
}

/// True when the classification was stored upstream.
async fn classify_row(state: &AppState, row: &Row) -> bool {
    let name = agent_name(row).unwrap_or_default();
    let description = agent_description(row).unwrap_or_default();
    let category = categorize(state, &name, &description).await;
    let id = row.get("id").cloned().unwrap_or(Value::Null);

    let outbound = json!({
        "id": id,
        "category": category,
        "strategicScore": row_strategic_score(row),
        "agentName": name,
        "agentDescription": description,
        "classifiedAt": timestamp(),
    });
    match state
        .webhooks
        .post_json(&state.config.webhooks.classify, &outbound)
        .await
        .and_then(|resp| resp.ensure_success("classify"))
    {
        Ok(_) => {
            info!(id = %id, category = %category, "canvas classified");
            true
        }
        Err(e) => {
            warn!(id = %id, error = %e, "failed to store classification");
            false
        }
    }
}

/// Never fails: any problem yields the unclassified label.
async fn categorize(state: &AppState, name: &str, description: &str) -> String {
    if !state.llm.is_configured() {
        warn!("OPENAI_API_KEY is not set; skipping classification");
        return UNCLASSIFIED.to_string();
    }
    let request = ChatRequest {
        model: state.config.openai.classify_model.clone(),
        messages: vec![
            LlmMessage::system(classification_prompt()),
            LlmMessage::user(classification_user_message(name, description)),
        ],
        temperature: Some(0.3),
        max_tokens: Some(20),
        json_mode: false,
    };
    match state.llm.chat_completion(&request).await {
        Ok(completion) => {
            let category = completion.content.trim();
            if category.is_empty() {
                UNCLASSIFIED.to_string()
            } else {
                category.to_string()
            }
        }
        Err(e) => {
            warn!(error = %e, "classification call failed");
            UNCLASSIFIED.to_string()
        }
    }
}
