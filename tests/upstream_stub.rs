//! Real reqwest clients against a stub upstream bound to an ephemeral port.

use axum::{
    Json, Router,
    extract::{Multipart, Query},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use need_canvas::clients::{
    AudioUpload, ChatRequest, HttpWebhookClient, LlmClient, LlmMessage, OpenAiClient,
    RealtimeSessionRequest, ResponseInput, ResponsesRequest, WebhookClient,
};
use need_canvas::error::NeedCanvasError;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn chat(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "chatcmpl-1",
        "choices": [{ "message": { "content": json!({
            "auth": bearer(&headers),
            "model": body["model"],
            "format": body["response_format"]["type"],
        }).to_string() } }]
    }))
}

async fn responses(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "resp_42",
        "output": [
            { "type": "reasoning", "summary": [] },
            { "type": "message", "content": [{
                "type": "output_text",
                "text": json!({ "effort": body["reasoning"]["effort"], "items": body["input"].as_array().map(Vec::len) }).to_string()
            }] }
        ]
    }))
}

async fn realtime(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "beta": headers.get("openai-beta").and_then(|v| v.to_str().ok()),
        "voice": body["voice"],
        "modalities": body["modalities"],
    }))
}

async fn transcriptions(mut multipart: Multipart) -> Json<Value> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = if name == "file" {
            format!("{} bytes", field.bytes().await.unwrap().len())
        } else {
            field.text().await.unwrap()
        };
        fields.insert(name, value);
    }
    Json(json!({ "text": format!("{} {} {}", fields["model"], fields["language"], fields["file"]) }))
}

async fn hook_post(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "received": body }))
}

async fn hook_get(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({ "query": query }))
}

async fn unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .route("/v1/responses", post(responses))
        .route("/v1/realtime/sessions", post(realtime))
        .route("/v1/audio/transcriptions", post(transcriptions))
        .route("/hook", post(hook_post).get(hook_get))
        .route("/down", post(unavailable));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> OpenAiClient {
    OpenAiClient::new(
        &format!("{base}/v1/"),
        Some("sk-test".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn openai_client_talks_to_all_endpoints() {
    let base = spawn_stub().await;
    let llm = client(&base);

    let completion = llm
        .chat_completion(&ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![LlmMessage::user("bonjour")],
            json_mode: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let content: Value = serde_json::from_str(&completion.content).unwrap();
    assert_eq!(completion.id.as_deref(), Some("chatcmpl-1"));
    assert_eq!(content["auth"], "Bearer sk-test");
    assert_eq!(content["model"], "gpt-4o-mini");
    assert_eq!(content["format"], "json_object");

    let output = llm
        .responses(&ResponsesRequest {
            model: "gpt-5.1".into(),
            input: vec![ResponseInput::system("prompt"), ResponseInput::user("salut")],
            reasoning_effort: Some("medium".into()),
            max_output_tokens: None,
        })
        .await
        .unwrap();
    assert_eq!(output.id, "resp_42");
    let text: Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(text, json!({ "effort": "medium", "items": 2 }));

    let session = llm
        .realtime_session(&RealtimeSessionRequest {
            model: "gpt-realtime".into(),
            voice: "alloy".into(),
            modalities: vec!["text".into(), "audio".into()],
            instructions: "Helios".into(),
        })
        .await
        .unwrap();
    assert_eq!(session["beta"], "realtime=v1");
    assert_eq!(session["modalities"], json!(["text", "audio"]));

    let transcript = llm
        .transcribe(
            AudioUpload {
                bytes: vec![0u8; 16],
                file_name: "clip.webm".into(),
                content_type: Some("audio/webm".into()),
            },
            "gpt-4o-transcribe",
            "fr",
        )
        .await
        .unwrap();
    assert_eq!(transcript, "gpt-4o-transcribe fr 16 bytes");
}

#[tokio::test]
async fn openai_http_errors_are_upstream_failures() {
    let base = spawn_stub().await;
    let llm = OpenAiClient::new(&format!("{base}/missing"), Some("k".into()), Duration::from_secs(5))
        .unwrap();
    let err = llm
        .chat_completion(&ChatRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NeedCanvasError::Upstream { .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn webhook_client_posts_and_queries() {
    let base = spawn_stub().await;
    let hooks = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();

    let resp = hooks
        .post_json(&format!("{base}/hook"), &json!({ "id": "c1" }))
        .await
        .unwrap();
    assert!(resp.is_success());
    assert_eq!(resp.json().unwrap()["received"]["id"], "c1");

    let resp = hooks
        .get(&format!("{base}/hook"), &[("id", "canvas 7")])
        .await
        .unwrap();
    assert_eq!(resp.json().unwrap()["query"]["id"], "canvas 7");

    let resp = hooks
        .post_json(&format!("{base}/down"), &json!({}))
        .await
        .unwrap();
    assert_eq!(resp.status, 503);
    assert_eq!(resp.body, "maintenance");
    assert!(resp.ensure_success("vote").is_err());
}
