//! Shopify OAuth install callback.
//!
//! Shopify redirects the merchant here after they approve the app. The
//! response is plain text because the merchant sees it directly.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use shop_bridge_core::CallbackParams;
use tracing::instrument;

use crate::services::{InstallError, complete_install};
use crate::state::AppState;

/// Signed cookie naming the installed shop for the embedded frontend.
pub const SHOP_COOKIE: &str = "shop_domain";

/// GET /auth/callback - Complete an app installation.
///
/// | Outcome | Status | Body |
/// |---|---|---|
/// | installed | 200 | `App installed successfully` |
/// | bad signature | 400 | `HMAC validation failed` |
/// | exchange failed | 500 | `Internal Server Error` |
/// | store failed | 500 | `Failed to save shop token` |
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let installed = match complete_install(&state, &params).await {
        Ok(installed) => installed,
        Err(e) => return install_failed(&e),
    };

    let cookie = Cookie::build((SHOP_COOKIE, installed.shop.into_inner()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None);

    (jar.add(cookie), "App installed successfully").into_response()
}

fn install_failed(e: &InstallError) -> Response {
    match e {
        InstallError::SignatureInvalid => {}
        InstallError::Store(_) => tracing::error!(error = %e, "Failed to save shop token"),
        _ => tracing::error!(error = %e, "OAuth callback failed"),
    }

    (e.status_code(), e.public_message()).into_response()
}
