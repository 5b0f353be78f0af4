//! HTTP client for communicating with hintd.

use hint_shared::{
    CaptureResponse, ErrorResponse, HealthResponse, HintError, QueryRequest, QueryResponse,
    StatusResponse,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longer than the daemon's model timeout, so slow answers still arrive
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for communicating with hintd
pub struct HintdClient {
    http: reqwest::Client,
    base_url: String,
}

impl HintdClient {
    pub fn new(base_url: &str) -> Result<Self, HintError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HintError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> Result<HealthResponse, HintError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    pub async fn status(&self) -> Result<StatusResponse, HintError> {
        self.send(self.http.get(self.url("/status"))).await
    }

    /// Ask a question; the daemon picks the best answer source
    pub async fn ask(&self, query: &str) -> Result<QueryResponse, HintError> {
        let body = QueryRequest {
            query: query.to_string(),
        };
        self.send(self.http.post(self.url("/query")).json(&body)).await
    }

    /// Trigger a screenshot right now
    pub async fn capture(&self) -> Result<CaptureResponse, HintError> {
        self.send(self.http.post(self.url("/screenshot"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, HintError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                HintError::DaemonUnreachable(self.base_url.clone())
            } else {
                HintError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HintError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Error for a non-success answer, using the `{error}` body when present
fn api_error(status: u16, body: &str) -> HintError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string());
    HintError::Api { status, message }
}
