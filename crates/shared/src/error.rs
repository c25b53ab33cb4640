use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the dashboard REST endpoints, e.g.
/// `{"error": "Missing player parameter."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
