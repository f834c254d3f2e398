//! Router composition.
//!
//! [`app`] is the single place where routes, fallback and middleware are
//! assembled. The binary and the integration tests both call it.
//! [`with_middleware`] applies the same stack to any router.

use std::any::Any;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Request, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::{AllowedOrigins, cors_layer, origin_guard};
use crate::routes;
use crate::state::AppState;

/// Shopify admin origin, for apps embedded in the admin.
pub const SHOPIFY_ADMIN_ORIGIN: &str = "https://admin.shopify.com";

/// Default maximum request body size (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Middleware settings for [`app`].
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    /// Origins allowed by CORS and the origin guard.
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Include error detail in JSON error bodies.
    pub expose_error_detail: bool,
}

impl MiddlewareConfig {
    /// Middleware settings for a loaded configuration: the frontend and the
    /// Shopify admin are allowed, and error detail is shown in development.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            allowed_origins: vec![config.frontend_url.clone(), SHOPIFY_ADMIN_ORIGIN.to_string()],
            body_limit: DEFAULT_BODY_LIMIT,
            expose_error_detail: config.is_development(),
        }
    }
}

/// Build the application with routes, fallback and all middleware.
pub fn app(state: AppState, middleware: &MiddlewareConfig) -> Router {
    with_middleware(routes::routes(), state, middleware)
}

/// Wrap `router` with the fallback and the full middleware stack.
///
/// Panics inside handlers are caught and rendered by the global error
/// handler, so a client always gets a JSON 500.
pub fn with_middleware(
    router: Router<AppState>,
    state: AppState,
    middleware: &MiddlewareConfig,
) -> Router {
    let allowed = AllowedOrigins::new(&middleware.allowed_origins, middleware.expose_error_detail);
    let expose_error_detail = middleware.expose_error_detail;

    router
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(middleware.body_limit))
        .layer(cors_layer(&allowed))
        .layer(axum::middleware::from_fn_with_state(allowed, origin_guard))
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| {
                AppError::from_panic(panic.as_ref()).into_response_with_detail(expose_error_detail)
            },
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
