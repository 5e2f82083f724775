use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::interview::AgentPhase;

const WEBHOOK_HOST: &str = "https://n8n-byhww-u43341.vm.elestio.app";

/// Main configuration structure loaded from need_canvas.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub webhooks: WebhookConfig,
    pub notify: NotifyConfig,
    /// Secrets and logging, read from the environment only
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Inbound HTTP server and outbound client limits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_bind: SocketAddr,
    pub request_timeout_ms: u64,
    pub upstream_timeout_ms: u64,
    pub session_capacity: usize,
    pub classify_concurrency: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            request_timeout_ms: 120_000,
            upstream_timeout_ms: 60_000,
            session_capacity: 1024,
            classify_concurrency: 4,
        }
    }
}

/// Language model endpoint and per-use model names.
///
/// `None` means "not set": the lookup falls back to `model`, then to the
/// built-in default for that use.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: Option<String>,
    pub model_fast: Option<String>,
    pub model_balanced: Option<String>,
    pub model_premium: Option<String>,
    pub realtime_model: String,
    pub transcribe_model: String,
    pub transcribe_language: String,
    pub classify_model: String,
    pub realtime_voice: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: None,
            model_fast: None,
            model_balanced: None,
            model_premium: None,
            realtime_model: "gpt-realtime".to_string(),
            transcribe_model: "gpt-4o-transcribe".to_string(),
            transcribe_language: "fr".to_string(),
            classify_model: "gpt-4o-mini".to_string(),
            realtime_voice: "alloy".to_string(),
        }
    }
}

impl OpenAiConfig {
    /// Chat model for the interview phase the client is in.
    pub fn model_for_phase(&self, phase: Option<AgentPhase>) -> String {
        let pick = |specific: &Option<String>, fallback: &str| {
            specific
                .clone()
                .or_else(|| self.model.clone())
                .unwrap_or_else(|| fallback.to_string())
        };
        match phase {
            Some(AgentPhase::Contexte) => pick(&self.model_fast, "gpt-4o-mini"),
            Some(
                AgentPhase::PainPoints
                | AgentPhase::Donnees
                | AgentPhase::Copilot
                | AgentPhase::AutomationAvancee,
            ) => pick(&self.model_balanced, "gpt-4.1-mini"),
            Some(AgentPhase::Normalisation) => pick(&self.model_premium, "gpt-4.1"),
            None => pick(&None, "gpt-4o-mini"),
        }
    }

    /// Model for end-of-interview normalization; ignores the generic `model`.
    pub fn normalize_model(&self) -> String {
        self.model_premium
            .clone()
            .unwrap_or_else(|| "gpt-5.1".to_string())
    }

    /// Model for the realtime transcript report.
    pub fn report_model(&self) -> String {
        self.model_premium
            .clone()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| "gpt-5.1".to_string())
    }

    /// Model driving the legacy session interview.
    pub fn legacy_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string())
    }
}

/// Reasoning-class models only accept the Responses API.
pub fn is_reasoning_model(model: &str) -> bool {
    ["gpt-5", "o3", "o1"].iter().any(|m| model.contains(m))
}

/// Workflow engine endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub finalize: String,
    pub canvas_normalize: String,
    pub add_gallery: String,
    pub get_gallery: String,
    pub vote: String,
    pub classify: String,
    pub template_agent: String,
    pub chat: String,
    /// Receives completed legacy sessions; nothing is posted when unset
    pub legacy: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            finalize: format!("{WEBHOOK_HOST}/webhook/b9b80ad2-991f-419b-bfaf-7d8faca3de72"),
            canvas_normalize: format!("{WEBHOOK_HOST}/webhook/canvas-normalize"),
            add_gallery: format!("{WEBHOOK_HOST}/webhook/add-to-gallery"),
            get_gallery: format!("{WEBHOOK_HOST}/webhook/5abf522a-fd25-4168-a020-f50f10024ffd"),
            vote: format!("{WEBHOOK_HOST}/webhook/79f3c8db-9eb9-420a-b681-0db016ce6b00"),
            classify: format!("{WEBHOOK_HOST}/webhook/ca0d8010-e38f-464f-8f47-450134a08fb3"),
            template_agent: format!(
                "{WEBHOOK_HOST}/webhook-test/62269d79-d231-4ee7-8ea0-90371261bd21"
            ),
            chat: format!("{WEBHOOK_HOST}/webhook/d10cfbf3-1516-4c7e-9150-d326f383de10"),
            legacy: None,
        }
    }
}

/// Recap emails for completed legacy sessions
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub email: Option<String>,
    pub mail_relay_url: Option<String>,
    pub subject: String,
    pub from: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            email: None,
            mail_relay_url: None,
            subject: "BMS – Récap entretien agentique".to_string(),
            from: "BMS Agentic Needs <no-reply@latry.consulting>".to_string(),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            log_level: "need_canvas=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses NEED_CANVAS_CONFIG environment variable or defaults to "need_canvas.toml"
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`Config::load`] with an explicit TOML path taking precedence.
    pub fn load_from(config_path: Option<&Path>) -> anyhow::Result<Self> {
        // NEED_CANVAS_ENV_FILE if set, else ./.env
        if let Ok(env_path) = std::env::var("NEED_CANVAS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = config_path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| std::env::var("NEED_CANVAS_CONFIG").ok())
            .unwrap_or_else(|| "need_canvas.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_from_env();
        config.validate();
        Ok(config)
    }

    /// Environment wins over the TOML file for every key it sets.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(m) = get("OPENAI_MODEL") {
            self.openai.model = Some(m);
        }
        if let Some(m) = get("OPENAI_MODEL_FAST") {
            self.openai.model_fast = Some(m);
        }
        if let Some(m) = get("OPENAI_MODEL_BALANCED") {
            self.openai.model_balanced = Some(m);
        }
        if let Some(m) = get("OPENAI_MODEL_PREMIUM") {
            self.openai.model_premium = Some(m);
        }
        if let Some(m) = get("OPENAI_REALTIME_MODEL").or_else(|| get("OPENAI_MODEL_REALTIME")) {
            self.openai.realtime_model = m;
        }

        let hooks = &mut self.webhooks;
        for (key, slot) in [
            ("N8N_WEBHOOK_URL", &mut hooks.finalize),
            ("N8N_WEBHOOK_CANVAS_NORMALIZE", &mut hooks.canvas_normalize),
            ("N8N_WEBHOOK_ADD_GALLERY", &mut hooks.add_gallery),
            ("N8N_WEBHOOK_GET_GALLERY", &mut hooks.get_gallery),
            ("N8N_WEBHOOK_VOTE", &mut hooks.vote),
            ("N8N_WEBHOOK_CLASSIFY", &mut hooks.classify),
            ("N8N_WEBHOOK_TEMPLATE_AGENT", &mut hooks.template_agent),
            ("N8N_WEBHOOK_CHAT", &mut hooks.chat),
        ] {
            if let Some(url) = get(key) {
                tracing::debug!("{} env override applied", key);
                *slot = url;
            }
        }
        if let Some(url) = get("N8N_WEBHOOK_LEGACY") {
            hooks.legacy = Some(url);
        }

        if let Some(email) = get("NOTIFY_EMAIL") {
            self.notify.email = Some(email);
        }
        if let Some(url) = get("NOTIFY_MAIL_RELAY_URL") {
            self.notify.mail_relay_url = Some(url);
        }

        if let Some(v) = get("NEED_CANVAS_HTTP_BIND") {
            match v.parse::<SocketAddr>() {
                Ok(bind) => self.server.http_bind = bind,
                Err(_) => tracing::warn!("NEED_CANVAS_HTTP_BIND '{}' is not a socket address", v),
            }
        }
        if let Some(ms) = get("NEED_CANVAS_UPSTREAM_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.server.upstream_timeout_ms = ms;
        }
        if let Some(ms) = get("NEED_CANVAS_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.server.request_timeout_ms = ms;
        }
        if let Some(n) = get("NEED_CANVAS_SESSION_CAPACITY").and_then(|v| v.parse().ok()) {
            self.server.session_capacity = n;
        }
        if let Some(n) = get("NEED_CANVAS_CLASSIFY_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.server.classify_concurrency = n;
        }
    }

    /// Clamp values that would make the server unusable.
    pub fn validate(&mut self) {
        if self.server.classify_concurrency == 0 {
            tracing::warn!("classify_concurrency 0 is invalid, using 1");
            self.server.classify_concurrency = 1;
        } else if self.server.classify_concurrency > 32 {
            tracing::warn!(
                "classify_concurrency {} exceeds max 32, clamping to 32",
                self.server.classify_concurrency
            );
            self.server.classify_concurrency = 32;
        }
        if self.server.session_capacity == 0 {
            tracing::warn!("session_capacity 0 is invalid, using 1");
            self.server.session_capacity = 1;
        }
        if self.server.upstream_timeout_ms == 0 {
            self.server.upstream_timeout_ms = ServerConfig::default().upstream_timeout_ms;
        }
        if self.server.request_timeout_ms < self.server.upstream_timeout_ms {
            tracing::warn!(
                "request_timeout_ms {} is below upstream_timeout_ms {}",
                self.server.request_timeout_ms,
                self.server.upstream_timeout_ms
            );
        }
        if self.notify.email.is_some() && self.notify.mail_relay_url.is_none() {
            tracing::warn!("NOTIFY_EMAIL is set without NOTIFY_MAIL_RELAY_URL; recap emails disabled");
        }
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.runtime.openai_api_key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_model_for_phase_defaults() {
        let openai = OpenAiConfig::default();
        assert_eq!(openai.model_for_phase(Some(AgentPhase::Contexte)), "gpt-4o-mini");
        assert_eq!(openai.model_for_phase(Some(AgentPhase::Donnees)), "gpt-4.1-mini");
        assert_eq!(openai.model_for_phase(Some(AgentPhase::Normalisation)), "gpt-4.1");
        assert_eq!(openai.model_for_phase(None), "gpt-4o-mini");
        assert_eq!(openai.normalize_model(), "gpt-5.1");
    }

    #[test]
    fn test_generic_model_fills_unset_tiers() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_MODEL_FAST", "gpt-4.1-nano"),
        ]));
        let openai = &config.openai;
        assert_eq!(openai.model_for_phase(Some(AgentPhase::Contexte)), "gpt-4.1-nano");
        assert_eq!(openai.model_for_phase(Some(AgentPhase::Copilot)), "gpt-4o");
        assert_eq!(openai.model_for_phase(None), "gpt-4o");
        assert_eq!(openai.report_model(), "gpt-4o");
        assert_eq!(openai.normalize_model(), "gpt-5.1");
    }

    #[test]
    fn test_reasoning_models() {
        assert!(is_reasoning_model("gpt-5.1"));
        assert!(is_reasoning_model("o3-mini"));
        assert!(!is_reasoning_model("gpt-4.1"));
    }

    #[test]
    fn test_webhook_env_overrides_and_fallbacks() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("N8N_WEBHOOK_VOTE", "http://localhost:5678/webhook/vote"),
            ("N8N_WEBHOOK_CHAT", "  "),
            ("OPENAI_MODEL_REALTIME", "gpt-realtime-mini"),
        ]));
        assert_eq!(config.webhooks.vote, "http://localhost:5678/webhook/vote");
        assert!(config.webhooks.chat.ends_with("d10cfbf3-1516-4c7e-9150-d326f383de10"));
        assert_eq!(config.openai.realtime_model, "gpt-realtime-mini");
        assert!(config.webhooks.legacy.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            classify_concurrency = 8

            [openai]
            model_premium = "gpt-4.1"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.classify_concurrency, 8);
        assert_eq!(config.server.upstream_timeout_ms, 60_000);
        assert_eq!(config.openai.normalize_model(), "gpt-4.1");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("NEED_CANVAS_CLASSIFY_CONCURRENCY", "0"),
            ("NEED_CANVAS_SESSION_CAPACITY", "0"),
            ("NEED_CANVAS_HTTP_BIND", "not-an-addr"),
        ]));
        config.validate();
        assert_eq!(config.server.classify_concurrency, 1);
        assert_eq!(config.server.session_capacity, 1);
        assert_eq!(config.server.http_bind, ServerConfig::default().http_bind);
    }

    #[test]
    fn test_runtime_blank_key_is_missing() {
        let runtime = RuntimeConfig::from_lookup(lookup(&[("OPENAI_API_KEY", " ")]));
        assert!(runtime.openai_api_key.is_none());
        assert_eq!(runtime.log_level, "need_canvas=info,tower_http=info");
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[webhooks]\nlegacy = \"http://127.0.0.1:5678/legacy\"").unwrap();
        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.webhooks.legacy.as_deref(), Some("http://127.0.0.1:5678/legacy"));
    }

    #[test]
    fn test_load_from_rejects_broken_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nhttp_bind = ").unwrap();
        assert!(Config::load_from(Some(file.path())).is_err());
    }
}
