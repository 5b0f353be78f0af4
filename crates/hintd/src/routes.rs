//! API routes for hintd

use crate::server::AppState;
use crate::service::ServiceError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hint_shared::{
    CaptureResponse, ErrorResponse, HealthResponse, QueryRequest, QueryResponse, StatusResponse,
};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::EmptyQuery => api_error(StatusCode::BAD_REQUEST, "Empty query"),
            ServiceError::Capture(_) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

// ============================================================================
// Health & Status Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(state.service.health())
}

async fn status(State(state): State<AppStateArc>) -> Json<StatusResponse> {
    Json(state.service.status().await)
}

// ============================================================================
// Query Routes
// ============================================================================

pub fn query_routes() -> Router<AppStateArc> {
    Router::new().route("/query", post(query))
}

async fn query(
    State(state): State<AppStateArc>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let response = state.service.resolve_query(&req.query).await?;
    Ok(Json(QueryResponse { response }))
}

// ============================================================================
// Capture Routes
// ============================================================================

pub fn capture_routes() -> Router<AppStateArc> {
    Router::new().route("/screenshot", post(screenshot))
}

async fn screenshot(State(state): State<AppStateArc>) -> Result<Json<CaptureResponse>, ApiError> {
    match state.service.manual_capture().await {
        Ok(image) => {
            info!("Screenshot captured: {}", image.path.display());
            Ok(Json(CaptureResponse {
                message: "Screenshot captured successfully".to_string(),
            }))
        }
        Err(e) => {
            error!("Screenshot error: {}", e);
            Err(e.into())
        }
    }
}
