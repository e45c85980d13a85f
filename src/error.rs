use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("HTTP server failed: {0}")]
    Server(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status}: {description}")]
    HttpStatus {
        status: reqwest::StatusCode,
        description: String,
    },
    #[error("invalid JSON payload: {message}")]
    Json { message: String },
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("missing field in API response: {field}")]
    MissingField { field: &'static str },
}

impl From<reqwest::Error> for TelegramError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_status() {
            if let Some(status) = source.status() {
                return Self::HttpStatus {
                    status,
                    description: String::new(),
                };
            }
        }
        Self::Request { source }
    }
}

impl TelegramError {
    /// The request never got an answer from the API (connect failure, timeout).
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

/// A notification could not be handed to the messaging platform.
#[derive(Debug, Error)]
#[error("delivery failed: {detail}")]
pub struct DeliveryError {
    pub detail: String,
}

impl From<TelegramError> for DeliveryError {
    fn from(err: TelegramError) -> Self {
        Self {
            detail: err.to_string(),
        }
    }
}

/// Outcome classes of the ingestion boundary, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),
    #[error("service is in maintenance mode")]
    Unavailable,
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl IngestError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
