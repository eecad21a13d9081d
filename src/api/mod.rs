//! HTTP handlers

pub mod stats;
pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

pub use stats::{root, status};
pub use webhook::handle_webhook;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/status", routing::get(status))
        .route("/webhook", routing::post(handle_webhook))
        .with_state(state)
}
