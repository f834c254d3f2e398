//! Health check endpoint.

use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Deployment environment (`NODE_ENV`).
    pub env: String,
    /// Current time, RFC 3339 UTC with millisecond precision.
    pub timestamp: String,
}

/// Liveness health check endpoint.
///
/// Does not check dependencies; the credential store is not touched.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        env: state.config().environment.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
