//! Server-side state for the legacy session interview.

use axum::http::{HeaderMap, header};
use chrono::{SecondsFormat, Utc};
use lru::LruCache;
use serde_json::{Value, json};
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "need_canvas_session";

/// Bounded in-memory session states; the least recently used one is evicted first.
pub struct SessionStore {
    states: Mutex<LruCache<String, Value>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            states: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Value> {
        self.states.lock().await.get(id).cloned()
    }

    pub async fn put(&self, id: String, state: Value) {
        self.states.lock().await.put(id, state);
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 12 hex characters identifying one interview.
pub fn new_interview_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fresh state of a new or reset legacy interview.
pub fn default_legacy_state() -> Value {
    json!({
        "meta": {
            "title": "BMS – Recueil de besoins (M365 Copilot)",
            "version": "1.0.0",
            "interview_id": new_interview_id(),
            "timestamp_start": utc_now_iso(),
        },
        "participant": {
            "name": null,
            "role": null,
            "team": null,
            "location": null,
        },
        "context": {
            "business_unit": null,
            "product_lines": [],
            "markets": [],
            "tools": {
                "MDM": null,
                "PIM": null,
                "PLM": null,
                "ERP": null,
                "Office": [],
                "SharePoint": [],
            },
            "languages": [],
            "volume": { "labels_per_month": null },
        },
        "pain_points": [],
        "opportunities": [],
        "agent_ideas": [],
        "data_requirements": {
            "sources": [],
            "access": { "auth": null },
            "terminology_sources": [],
            "languages": null,
        },
        "m365_copilot_fit": { "fit_score": null, "remarks": null },
        "strategic_fit_matrix": { "importance": null, "frequency": null, "quadrant": null },
        "summary": null,
        "next_steps": [],
        "complete": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_interview_id_is_12_hex() {
        let id = new_interview_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; need_canvas_session=abc123 ; other=1"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc123"));
        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_default_state_shape() {
        let state = default_legacy_state();
        assert_eq!(state["complete"], json!(false));
        assert!(state["context"]["tools"]["Office"].is_array());
        assert!(state["meta"]["timestamp_start"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_store_evicts_least_recent() {
        let store = SessionStore::new(2);
        store.put("a".into(), json!(1)).await;
        store.put("b".into(), json!(2)).await;
        assert!(store.get("a").await.is_some());
        store.put("c".into(), json!(3)).await;
        assert!(store.get("b").await.is_none());
        assert!(store.get("a").await.is_some());
        assert!(store.get("c").await.is_some());
    }
}
