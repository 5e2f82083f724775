//! Custom deserializers for forgiving field parsing in need-canvas.
//!
//! Structured needs are filled in by a language model and gallery rows come
//! back from a spreadsheet-backed webhook, so the same field can arrive as a
//! string, a number, a list, or `null`. These helpers accept all of those while
//! still producing the typed shape the rest of the crate relies on.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_to_string(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Deserializes a required string, mapping `null` to `""` and scalars to their text.
///
/// # Examples
///
/// ```json
/// { "approximateVolume": "500 fichiers" }   // "500 fichiers"
/// { "approximateVolume": 500 }              // "500"
/// { "approximateVolume": null }             // ""
/// ```
pub fn de_string_lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(v).unwrap_or_default())
}

/// Deserializes an optional string, treating blank text as absent.
pub fn de_option_string_forgiving<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Value>::deserialize(deserializer)?;
    Ok(opt
        .and_then(scalar_to_string)
        .filter(|s| !s.trim().is_empty()))
}

/// Deserializes a string list with support for string, array, or null values.
///
/// # Accepted Formats
///
/// * **Null**: `null` → `[]`
/// * **String**: `"KPI"` → `["KPI"]`
/// * **Array**: `["a", 2]` → `["a", "2"]` (non-strings converted to text, nulls dropped)
pub fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
    })
}

/// Deserializes a non-negative counter accepting integers, floats and numeric strings.
/// Anything unparseable becomes 0, matching `parseInt(x) || 0`.
pub fn de_u64_forgiving<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref().map(parse_count).unwrap_or(0))
}

/// Integer prefix parse in the spirit of `parseInt`: `"12 votes"` → 12.
pub fn parse_count(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de_string_lenient")]
        text: String,
        #[serde(default, deserialize_with = "de_option_string_forgiving")]
        maybe: Option<String>,
        #[serde(default, deserialize_with = "de_string_list")]
        list: Vec<String>,
        #[serde(default, deserialize_with = "de_u64_forgiving")]
        count: u64,
    }

    #[test]
    fn test_numbers_become_text() {
        let p: Probe = serde_json::from_value(json!({"text": 500, "maybe": 2.5})).unwrap();
        assert_eq!(p.text, "500");
        assert_eq!(p.maybe.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_nulls_and_blanks_fall_back() {
        let p: Probe =
            serde_json::from_value(json!({"text": null, "maybe": "  ", "list": null, "count": null}))
                .unwrap();
        assert_eq!(p.text, "");
        assert!(p.maybe.is_none());
        assert!(p.list.is_empty());
        assert_eq!(p.count, 0);
    }

    #[test]
    fn test_single_string_becomes_list() {
        let p: Probe = serde_json::from_value(json!({"list": "Réduire le temps"})).unwrap();
        assert_eq!(p.list, vec!["Réduire le temps".to_string()]);
        let p: Probe = serde_json::from_value(json!({"list": ["a", 2, null]})).unwrap();
        assert_eq!(p.list, vec!["a".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_parse_count_like_parse_int() {
        assert_eq!(parse_count(&json!("12")), 12);
        assert_eq!(parse_count(&json!("7 votes")), 7);
        assert_eq!(parse_count(&json!(3)), 3);
        assert_eq!(parse_count(&json!("abc")), 0);
        assert_eq!(parse_count(&json!(-4)), 0);
    }
}
