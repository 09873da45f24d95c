//! HTTP entry points: the Telegram webhook, health checks, the `/api/` stub
//! and the static landing page.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::error;

use crate::bot;
use crate::platform::{Responder, Update};

// Placeholder page served for every path without a handler.
const INDEX_HTML: &str = include_str!("../static/index.html");

const API_PREFIX: &str = "/api/";

/// Shared, read-only state for all requests.
pub struct AppState {
    pub responder: Arc<dyn Responder>,
    pub started_at: DateTime<Utc>,
    pub bot_status: String,
}

impl AppState {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            started_at: Utc::now(),
            bot_status: "webhook".to_string(),
        }
    }
}

pub fn router(state: Arc<AppState>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(webhook).fallback(fallback))
        .route("/health", get(health).fallback(fallback))
        .route("/api/health", get(health).fallback(fallback))
        .fallback(fallback)
        .with_state(state)
}

async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match handle_webhook(&state, &body).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))).into_response(),
        Err(e) => {
            error!("Error processing webhook update: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": format!("{:#}", e)})),
            )
                .into_response()
        }
    }
}

async fn handle_webhook(state: &AppState, body: &[u8]) -> Result<()> {
    let update: Update =
        serde_json::from_slice(body).context("Invalid update payload")?;
    bot::process_update(update, state.responder.as_ref()).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(json!({
        "status": "ok",
        "bot_running": true,
        "bot_status": state.bot_status,
        "uptime": format_duration(uptime),
    }))
}

async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with(API_PREFIX) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Not implemented"})),
        )
            .into_response();
    }
    Html(INDEX_HTML).into_response()
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        return format!("{hours}h {mins}m {secs}s");
    }
    if mins > 0 {
        return format!("{mins}m {secs}s");
    }
    format!("{secs}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::tests::{FailingResponder, RecordingResponder};
    use crate::commands::WELCOME_MESSAGE;
    use serde_json::Value;

    async fn spawn_app(responder: Arc<dyn Responder>) -> String {
        let app = router(Arc::new(AppState::new(responder)), "/webhook");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_webhook_start_replies_once() {
        let responder = Arc::new(RecordingResponder::default());
        let base = spawn_app(responder.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .json(&json!({
                "update_id": 10,
                "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "/start"}
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok"}));

        let sent = responder.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_webhook_invalid_json_is_500() {
        let responder = Arc::new(RecordingResponder::default());
        let base = spawn_app(responder.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert!(!body["message"].as_str().unwrap().is_empty());
        assert!(responder.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_without_message_is_ok() {
        let responder = Arc::new(RecordingResponder::default());
        let base = spawn_app(responder.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .json(&json!({"update_id": 11, "edited_message": {"chat": {"id": 1}}}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(responder.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_send_failure_is_500() {
        let base = spawn_app(Arc::new(FailingResponder)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .json(&json!({"message": {"chat": {"id": 42}, "text": "/help"}}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("blocked"));
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let base = spawn_app(Arc::new(RecordingResponder::default())).await;

        for path in ["/health", "/api/health"] {
            let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["status"], "ok");
            assert_eq!(body["bot_running"], true);
            assert_eq!(body["bot_status"], "webhook");
            assert!(body["uptime"].as_str().unwrap().ends_with('s'));
        }
    }

    #[tokio::test]
    async fn test_api_stub_is_404() {
        let base = spawn_app(Arc::new(RecordingResponder::default())).await;
        let client = reqwest::Client::new();

        let resp = client.get(format!("{base}/api/templates")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"error": "Not implemented"}));

        let resp = client.post(format!("{base}/api/health")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_paths_serve_index() {
        let base = spawn_app(Arc::new(RecordingResponder::default())).await;

        for path in ["/", "/about", "/webhook", "/api"] {
            let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK, "{path}");
            let body = resp.text().await.unwrap();
            assert!(body.contains("<html"), "{path}");
        }
    }

    #[tokio::test]
    async fn test_health_reports_uptime_since_start() {
        let mut state = AppState::new(Arc::new(RecordingResponder::default()));
        state.started_at = Utc::now() - chrono::Duration::seconds(3725);

        let Json(body) = health(State(Arc::new(state))).await;

        let uptime = body["uptime"].as_str().unwrap();
        assert!(uptime.starts_with("1h 2m "), "{uptime}");
        assert_eq!(body["bot_running"], true);
    }

    #[tokio::test]
    async fn test_health_uptime_for_fresh_start() {
        let state = AppState::new(Arc::new(RecordingResponder::default()));

        let Json(body) = health(State(Arc::new(state))).await;

        let uptime = body["uptime"].as_str().unwrap();
        assert!(uptime == "0s" || uptime == "1s", "{uptime}");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
        assert_eq!(format_duration(-3), "0s");
    }
}
