//! Normalizing gallery rows returned by the workflow engine.
//!
//! Rows come from a spreadsheet behind the webhook: keys may be flattened
//! (`strategicFit.importance`), lists may be JSON text with typographic
//! punctuation, and an empty cell is an empty string rather than a missing key.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::canvas::{UNDEFINED_FIELD, UseCaseCanvas};
use crate::deserializers::parse_count;
use crate::json_text::is_truthy;
use crate::need::{FitLevel, StrategicFit};

pub type Row = Map<String, Value>;

/// A canvas as listed in the gallery, with the agent naming added by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub agent_name: String,
    pub agent_description: String,
    #[serde(flatten)]
    pub canvas: UseCaseCanvas,
}

/// Upstream answers with an array for several rows and a bare object for one.
pub fn rows_from_payload(payload: Value) -> Vec<Row> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    }
}

fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First truthy value among `keys`, as text.
pub fn text_field(row: &Row, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| is_truthy(v))
        .map(as_text)
}

fn text_or(row: &Row, keys: &[&str], fallback: &str) -> String {
    text_field(row, keys).unwrap_or_else(|| fallback.to_string())
}

/// Replaces the punctuation spreadsheets substitute into JSON text.
pub fn clean_json_text(raw: &str) -> String {
    raw.replace('–', "-")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

fn parse_list(value: Option<&Value>) -> Option<Vec<String>> {
    let value = match value {
        None => return Some(Vec::new()),
        Some(v) if !is_truthy(v) => return Some(Vec::new()),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Array(items) => Value::Array(items.clone()),
        Value::String(s) => serde_json::from_str(&clean_json_text(s)).ok()?,
        _ => return None,
    };
    match parsed {
        Value::Array(items) => Some(items.iter().filter(|v| !v.is_null()).map(as_text).collect()),
        _ => None,
    }
}

/// `field[0]` … `field[9]` columns written when the list was spread over cells.
fn indexed_list(row: &Row, field: &str) -> Vec<String> {
    (0..10)
        .filter_map(|i| row.get(&format!("{field}[{i}]")))
        .filter(|v| is_truthy(v))
        .map(as_text)
        .collect()
}

fn list_field(row: &Row, field: &str, rebuild: bool, fallback: &[&str]) -> Vec<String> {
    if let Some(list) = parse_list(row.get(field)) {
        return list;
    }
    debug!(field, "list column is not valid JSON, rebuilding");
    let rebuilt = if rebuild {
        indexed_list(row, field)
    } else {
        Vec::new()
    };
    if rebuilt.is_empty() {
        fallback.iter().map(|s| s.to_string()).collect()
    } else {
        rebuilt
    }
}

fn level(row: &Row, flat_key: &str, nested_key: &str) -> FitLevel {
    let nested = row
        .get("strategicFit")
        .and_then(|fit| fit.get(nested_key))
        .filter(|v| is_truthy(v));
    row.get(flat_key)
        .filter(|v| is_truthy(v))
        .or(nested)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn strategic_fit(row: &Row) -> StrategicFit {
    let rationale = row
        .get("strategicFit.rationale")
        .filter(|v| is_truthy(v))
        .or_else(|| row.get("strategicFit").and_then(|fit| fit.get("rationale")))
        .filter(|v| is_truthy(v))
        .map(as_text)
        .unwrap_or_default();
    StrategicFit {
        importance: level(row, "strategicFit.importance", "importance"),
        frequency: level(row, "strategicFit.frequency", "frequency"),
        rationale,
    }
}

fn voters(row: &Row) -> Vec<String> {
    match row.get("voters") {
        Some(Value::Array(items)) => items.iter().map(as_text).collect(),
        Some(Value::String(s)) if !s.is_empty() => {
            match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => items.iter().map(as_text).collect(),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

pub fn agent_name(row: &Row) -> Option<String> {
    text_field(row, &["Agent-Name", "agentName"])
}

pub fn agent_description(row: &Row) -> Option<String> {
    text_field(row, &["Agent-Description", "agentDescription"])
}

/// Rebuilds one clean gallery entry from a raw row.
pub fn entry_from_row(row: &Row) -> GalleryEntry {
    let id = text_field(row, &["id"]).unwrap_or_else(|| {
        let suffix = text_field(row, &["row_number"])
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());
        format!("canvas-{suffix}")
    });

    let canvas = UseCaseCanvas {
        id,
        created_at: text_or(row, &["createdAt"], &Utc::now().to_rfc3339()),
        submitted_by: text_or(row, &["submittedBy"], "anonymous"),
        persona: text_or(row, &["Persona", "persona"], UNDEFINED_FIELD),
        painpoint: text_or(row, &["painpoint"], UNDEFINED_FIELD),
        opportunite_copilot: text_or(row, &["opportunitécopilot"], UNDEFINED_FIELD),
        problem_to_solve: text_or(row, &["problemToSolve"], UNDEFINED_FIELD),
        use_case_description: text_or(row, &["useCaseDescription"], UNDEFINED_FIELD),
        data_and_product_used: list_field(row, "dataAndProductUsed", true, &[UNDEFINED_FIELD]),
        business_objective: text_or(row, &["businessObjective"], UNDEFINED_FIELD),
        key_results: list_field(row, "keyResults", true, &[]),
        stakeholders: list_field(row, "stakeholders", false, &[]),
        strategic_fit: strategic_fit(row),
        votes: row.get("votes").map(parse_count).unwrap_or(0),
        voters: voters(row),
    };

    GalleryEntry {
        agent_name: agent_name(row).unwrap_or_else(|| "Agent sans nom".to_string()),
        agent_description: agent_description(row)
            .unwrap_or_else(|| "Description à définir".to_string()),
        canvas,
    }
}

/// Strategic score of a raw row; missing levels count as medium, unknown as low.
pub fn row_strategic_score(row: &Row) -> u8 {
    let weight = |key: &str| {
        let label = text_field(row, &[key]).unwrap_or_else(|| "medium".to_string());
        label.parse::<FitLevel>().map(|l| l.weight()).unwrap_or(1)
    };
    weight("strategicFit.importance") * weight("strategicFit.frequency")
}
