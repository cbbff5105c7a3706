//! Keep-alive HTTP listener - liveness probe, session status, manual sends

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::BotError;
use crate::application::messaging::split_message;
use crate::application::monitor::{MonitorError, SessionMonitor, SessionStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session: Option<String>,
    pub channel_id: String,
    pub message: String,
}

pub fn router(monitor: SessionMonitor) -> Router {
    Router::new()
        .route("/api", get(liveness))
        .route("/api/status", get(status))
        .route("/api/send-message", post(send_message))
        .with_state(monitor)
}

/// Serve the keep-alive API until the listener fails
pub async fn serve(port: u16, monitor: SessionMonitor) -> Result<(), BotError> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Keep-alive server running on port {}", port);
    axum::serve(listener, router(monitor)).await?;
    Ok(())
}

async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Dev Assistant Discord Bot is running",
    }))
}

async fn status(State(monitor): State<SessionMonitor>) -> Json<Vec<SessionStatus>> {
    Json(monitor.snapshot().await)
}

async fn send_message(
    State(monitor): State<SessionMonitor>,
    Json(request): Json<SendMessageRequest>,
) -> (StatusCode, Json<Value>) {
    let outbox = match monitor.outbox(request.session.as_deref()).await {
        Ok(outbox) => outbox,
        Err(e) => {
            let code = match e {
                MonitorError::UnknownSession(_) => StatusCode::NOT_FOUND,
                MonitorError::NotReady(_) => StatusCode::CONFLICT,
                MonitorError::Ambiguous(_) => StatusCode::BAD_REQUEST,
            };
            return (code, Json(json!({ "message": e.to_string() })));
        }
    };

    for part in split_message(&request.message) {
        if let Err(e) = outbox.send_message(&request.channel_id, &part).await {
            tracing::warn!("Keep-alive send to {} failed: {}", request.channel_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to send message", "error": e.to_string() })),
            );
        }
    }

    (StatusCode::OK, Json(json!({ "message": "Message sent" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use crate::domain::entities::BotInfo;
    use crate::infrastructure::adapters::scripted::RecordingOutbox;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = router(SessionMonitor::new())
            .oneshot(Request::get("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_no_lifecycle_routes() {
        let app = router(SessionMonitor::new());
        for uri in ["/api/start", "/api/stop"] {
            let response = app
                .clone()
                .oneshot(post_json(uri, json!({ "session": "primary" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_status_lists_sessions() {
        let monitor = SessionMonitor::new();
        monitor.starting("bot0").await;
        monitor.ready("bot1", BotInfo::new("11", "beta"), Arc::new(RecordingOutbox::new())).await;

        let response = router(monitor)
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body[0]["session"], "bot0");
        assert_eq!(body[0]["state"], "starting");
        assert_eq!(body[1]["state"], "ready");
        assert_eq!(body[1]["botName"], "beta");
    }

    #[tokio::test]
    async fn test_send_message_through_ready_session() {
        let monitor = SessionMonitor::new();
        let outbox = Arc::new(RecordingOutbox::new());
        monitor.ready("primary", BotInfo::new("1", "alpha"), outbox.clone()).await;

        let response = router(monitor)
            .oneshot(post_json("/api/send-message", json!({ "channelId": "42", "message": "deploy done" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, "42");
        assert_eq!(sent[0].text, "deploy done");
    }

    #[tokio::test]
    async fn test_send_message_errors() {
        let monitor = SessionMonitor::new();
        monitor.starting("primary").await;
        let app = router(monitor);

        let not_ready = app
            .clone()
            .oneshot(post_json("/api/send-message", json!({ "session": "primary", "channelId": "42", "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(not_ready.status(), StatusCode::CONFLICT);

        let unknown = app
            .oneshot(post_json("/api/send-message", json!({ "session": "nope", "channelId": "42", "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
