use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveUpdateError {
    #[error("malformed live-update envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },
    #[error("server_url must start with http:// or https://, got '{0}'")]
    InvalidServerUrl(String),
    #[error("failed to connect live channel {url}: {source}")]
    Connect {
        url: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[error("GET {path} returned {status}: {message}")]
    Status {
        path: &'static str,
        status: StatusCode,
        message: String,
    },
}
