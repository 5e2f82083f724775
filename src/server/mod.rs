//! HTTP server: shared state, router and request logging.

use axum::{
    BoxError, Json, Router,
    body::Body,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration, time::Instant};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::clients::{HttpWebhookClient, LlmClient, OpenAiClient, WebhookClient};
use crate::config::Config;
use crate::notify::{MailRelayNotifier, Notifier};
use crate::session::SessionStore;

pub mod extract;
pub mod routes;

/// Largest accepted audio upload for transcription.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmClient>,
    pub webhooks: Arc<dyn WebhookClient>,
    /// Set only when both a recipient and a mail relay are configured
    pub notifier: Option<Arc<dyn Notifier>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm: Arc<dyn LlmClient>,
        webhooks: Arc<dyn WebhookClient>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.server.session_capacity));
        Self {
            config: Arc::new(config),
            llm,
            webhooks,
            notifier,
            sessions,
        }
    }

    /// Wires the real reqwest clients from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.server.upstream_timeout_ms);
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
            &config.openai.base_url,
            config.runtime.openai_api_key.clone(),
            timeout,
        )?);
        let webhooks: Arc<dyn WebhookClient> = Arc::new(HttpWebhookClient::new(timeout)?);
        let notifier = match (&config.notify.email, &config.notify.mail_relay_url) {
            (Some(_), Some(relay)) => Some(Arc::new(MailRelayNotifier::new(
                webhooks.clone(),
                relay.clone(),
                config.notify.from.clone(),
            )) as Arc<dyn Notifier>),
            _ => None,
        };
        if !llm.is_configured() {
            tracing::warn!("OPENAI_API_KEY is not set; model-backed routes will answer 500");
        }
        Ok(Self::new(config, llm, webhooks, notifier))
    }
}

async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let resp = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = resp.status().as_u16();
    if resp.status().is_server_error() {
        tracing::warn!(%method, path = %path, status, latency_ms, "request failed");
    } else {
        tracing::info!(%method, path = %path, status, latency_ms, "request served");
    }
    resp
}

async fn handle_timeout(err: BoxError) -> (StatusCode, Json<Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "Délai de traitement dépassé." })),
        )
    } else {
        tracing::error!(error = %err, "middleware failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Erreur interne du serveur." })),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_millis(state.config.server.request_timeout_ms);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/chat", post(routes::chat::chat))
        .route("/api/chat-webhook", post(routes::chat_webhook::chat_webhook))
        .route("/api/normalize", post(routes::normalize::normalize))
        .route(
            "/api/canvas-normalize",
            post(routes::canvas_normalize::canvas_normalize),
        )
        .route("/api/finalize", post(routes::finalize::finalize))
        .route(
            "/api/add-to-gallery",
            post(routes::add_to_gallery::add_to_gallery),
        )
        .route(
            "/api/gallery",
            get(routes::gallery::list_gallery).post(routes::gallery::vote),
        )
        .route(
            "/api/template-agent",
            get(routes::template_agent::template_agent),
        )
        .route("/api/admin/classify", post(routes::classify::classify))
        .route(
            "/api/realtime-session",
            post(routes::realtime::realtime_session),
        )
        .route(
            "/api/realtime-report",
            post(routes::realtime::realtime_report),
        )
        .route(
            "/api/transcribe",
            post(routes::transcribe::transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route("/legacy/api", post(routes::legacy::legacy_api))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(state: AppState) -> anyhow::Result<()> {
    let bind = state.config.server.http_bind;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
