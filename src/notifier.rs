//! Outbound delivery of formatted messages to a chat webhook

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{error, info};

use crate::NotifierConfig;
use crate::error::NotifierError;

/// Longest slice of a failed response body kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` once. Failures are reported in the result, never retried.
    async fn send(&self, text: &str) -> DeliveryResult;
}

/// Posts `{"<text_field>": text}` to a chat platform's incoming webhook URL.
pub struct ChatWebhookNotifier {
    client: reqwest::Client,
    url: String,
    text_field: String,
}

impl ChatWebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifierError> {
        let url = config
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| NotifierError::ConfigError("notifier.url is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            text_field: config.text_field.clone(),
        })
    }

    async fn post(&self, text: &str) -> Result<(), NotifierError> {
        let mut body = Map::new();
        body.insert(self.text_field.clone(), Value::String(text.to_string()));

        let resp = self.client.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let resp_body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(NotifierError::DeliveryFailed(format!(
                "chat webhook returned {}: {}",
                status.as_u16(),
                resp_body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for ChatWebhookNotifier {
    async fn send(&self, text: &str) -> DeliveryResult {
        info!("Sending notification ({} bytes)", text.len());
        match self.post(text).await {
            Ok(()) => {
                info!("Notification delivered");
                DeliveryResult::delivered()
            }
            Err(e) => {
                error!("Notification delivery failed: {}", e);
                DeliveryResult::failed(e.to_string())
            }
        }
    }
}
