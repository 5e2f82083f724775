use axum::{Json, extract::Query, extract::State};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result, ResultExt};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub id: Option<String>,
}

pub async fn template_agent(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::bad_request("ID du canvas requis"));
    };
    let template = fetch_template(&state, &id)
        .await
        .or_public("template-agent", "Impossible de récupérer le template agent.")?;
    Ok(Json(template))
}

async fn fetch_template(state: &AppState, id: &str) -> Result<Value> {
    state
        .webhooks
        .get(&state.config.webhooks.template_agent, &[("id", id)])
        .await?
        .ensure_success("template-agent")?
        .json()
}
