//! CORS allow-list and origin guard.
//!
//! Only the embedded app frontend and the Shopify admin may call this
//! server from a browser. Requests without an `Origin` header (curl, Shopify
//! redirects, server-to-server) always pass.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header::ORIGIN},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::error::AppError;

/// Origins allowed to make credentialed cross-origin requests.
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Arc<[HeaderValue]>,
    expose_error_detail: bool,
}

impl AllowedOrigins {
    /// Build the allow-list. Origins that are not valid header values are
    /// skipped with a warning.
    #[must_use]
    pub fn new<I, S>(origins: I, expose_error_detail: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .filter_map(|origin| {
                let origin = origin.as_ref();
                HeaderValue::from_str(origin)
                    .inspect_err(|_| tracing::warn!(origin, "Ignoring invalid CORS origin"))
                    .ok()
            })
            .collect();

        Self {
            origins,
            expose_error_detail,
        }
    }

    /// Whether `origin` is on the list. Comparison is exact.
    #[must_use]
    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    fn to_vec(&self) -> Vec<HeaderValue> {
        self.origins.to_vec()
    }
}

/// CORS layer for the allow-list, with credentials enabled.
///
/// Requested headers are mirrored, since a wildcard is not permitted
/// alongside credentials.
#[must_use]
pub fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.to_vec()))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

/// Reject requests whose `Origin` is not on the allow-list.
///
/// Runs outside the CORS layer so disallowed preflights are rejected too.
pub async fn origin_guard(
    State(allowed): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN)
        && !allowed.contains(origin)
    {
        let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
        tracing::warn!(
            %origin,
            path = %request.uri().path(),
            "Blocked request from disallowed origin"
        );
        return AppError::OriginNotAllowed(origin)
            .into_response_with_detail(allowed.expose_error_detail);
    }

    next.run(request).await
}
