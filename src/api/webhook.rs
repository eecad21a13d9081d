//! Webhook handler for GitHub push events

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::SharedState;
use crate::signature::verify_github_signature;

/// Handles the GitHub webhook POST request.
///
/// 401 on a bad or missing signature, 200 for ignored event types, 200 once
/// the notification is delivered and 500 if delivery fails.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let delivery_id = headers
        .get("X-GitHub-Delivery")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    // Verify against the raw body before anything parses it
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok());
    let secret = state.config.github.webhook_secret.as_deref();
    if !verify_github_signature(&body, signature, secret) {
        warn!(
            "Signature verification failed for delivery {} (header present: {})",
            delivery_id,
            signature.is_some()
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "error", "error": "Invalid signature"})),
        );
    }

    // Only handle "push" events.
    let event_opt = headers.get("X-GitHub-Event").and_then(|v| v.to_str().ok());
    if event_opt != Some("push") {
        info!(
            "Not push event; Received {:?} event (delivery {})",
            event_opt, delivery_id
        );
        return (
            StatusCode::OK,
            Json(json!({"status": "ignored", "event": event_opt})),
        );
    }

    let message = state.formatter.format_raw(&body);
    let result = state.notifier.send(&message).await;
    if !result.success {
        error!(
            "Delivery {} could not be forwarded: {}",
            delivery_id,
            result.error.as_deref().unwrap_or("unknown error")
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "error": result.error})),
        );
    }

    info!("Push notification sent for delivery {}", delivery_id);
    (StatusCode::OK, Json(json!({"status": "delivered"})))
}
