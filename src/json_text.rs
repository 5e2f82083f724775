//! Cleanup of JSON text produced by models and workflow engines.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{NeedCanvasError, Result};

static OPENING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").unwrap());
static CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());

/// Removes surrounding whitespace and a Markdown code fence, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = OPENING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let body = &trimmed[start..];
    let end = CLOSING_FENCE.find(body).map_or(body.len(), |m| m.start());
    &body[..end]
}

/// Parses model output that may be fenced.
pub fn parse_json_text(raw: &str) -> Result<Value> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| NeedCanvasError::Serialization {
        message: format!("invalid JSON text from upstream: {e}"),
    })
}

/// Loose truthiness: null, false, zero and "" are false, containers are true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Peels the wrappers the workflow engine puts around an agent answer.
///
/// Checked in order: `[{output: "<json>"}]`, `{message: {content: "<json>"}}`,
/// then a bare JSON string. Anything else is returned as is.
pub fn unwrap_envelope(mut data: Value) -> Result<Value> {
    if let Some(output) = data
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("output"))
        .filter(|o| !o.is_null())
    {
        data = match output {
            Value::String(text) => parse_json_text(text)?,
            other => other.clone(),
        };
    }

    if let Some(content) = data
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        data = parse_json_text(content)?;
    }

    if let Value::String(text) = &data {
        data = parse_json_text(text)?;
    }

    Ok(data)
}
