//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check with environment and time
//!
//! # Shopify OAuth
//! GET  /auth/callback          - Verify, exchange code, persist token
//! ```
//!
//! Any other path falls through to [`not_found`].

pub mod auth;
pub mod health;

use axum::{
    Router,
    extract::State,
    http::{Method, Uri},
    response::Response,
    routing::get,
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the application router (without middleware or fallback).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes())
}

/// Create the Shopify OAuth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/callback", get(auth::callback))
}

/// Fallback for unmatched routes: a 500 from the global error handler.
pub async fn not_found(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    AppError::NotFound(format!("{method} {}", uri.path()))
        .into_response_with_detail(state.config().is_development())
}
