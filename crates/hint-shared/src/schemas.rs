//! Request and response bodies of the daemon's HTTP surface.

use serde::{Deserialize, Serialize};

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub llm_enabled: bool,
}

/// `POST /query` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

/// `POST /query` success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub response: String,
}

/// `POST /screenshot` success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureResponse {
    pub message: String,
}

/// `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub screenshot_count: usize,
    pub llm_enabled: bool,
    pub current_game: Option<String>,
    pub capturing: bool,
}

/// Body of every 4xx/5xx answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
