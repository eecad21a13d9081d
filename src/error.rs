use std::io;

/// Custom error type for push_notifier operations
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Could not parse push payload: {0}")]
    PayloadParseError(#[from] serde_json::Error),

    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Helper type for Results that use NotifierError
pub type Result<T> = std::result::Result<T, NotifierError>;
