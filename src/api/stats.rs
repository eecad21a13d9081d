//! Status endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

/// Server status
#[derive(Debug, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub secret_configured: bool,
}

pub async fn root() -> &'static str {
    "push_notifier: POST GitHub push webhooks to /webhook"
}

/// GET /status - Service name, version and uptime
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<ServerStatus> {
    Json(ServerStatus {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        secret_configured: state.config.github.has_valid_secret(),
    })
}
