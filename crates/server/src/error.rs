//! Global error handler.
//!
//! Errors that escape a route become a 500 with a JSON body:
//!
//! ```json
//! { "error": "Internal Server Error", "message": "detail (development only)" }
//! ```
//!
//! Unmatched routes, rejected origins and handler panics all end up here.
//! The OAuth callback answers in plain text and does not go through here.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public message for every error rendered by the global handler.
pub const PUBLIC_MESSAGE: &str = "Internal Server Error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// No route matches the request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request `Origin` is not on the CORS allow-list.
    #[error("Not allowed by CORS")]
    OriginNotAllowed(String),

    /// A handler panicked.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl AppError {
    /// Turn a caught panic payload into an error, keeping its message.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| payload.downcast_ref::<&str>().copied())
            .unwrap_or("handler panicked");

        Self::Internal(message.to_string())
    }

    /// Build the response, including the error detail when `expose_detail`
    /// is set (development only).
    #[must_use]
    pub fn into_response_with_detail(self, expose_detail: bool) -> Response {
        match &self {
            Self::Internal(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Unhandled error"
                );
            }
            Self::NotFound(_) | Self::OriginNotAllowed(_) => {
                tracing::info!(error = %self, "Request rejected");
            }
        }

        let body = ErrorBody {
            error: PUBLIC_MESSAGE,
            message: expose_detail.then(|| self.to_string()),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with_detail(false)
    }
}
