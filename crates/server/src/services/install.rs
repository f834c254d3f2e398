//! App installation via the OAuth callback.
//!
//! A callback moves through three steps and stops at the first failure:
//!
//! 1. Verify the `hmac` signature over the query.
//! 2. Exchange the one-time `code` for an offline access token.
//! 3. Upsert the token for the shop.
//!
//! Nothing is retried. Shopify invalidates `code` once presented, so a failed
//! install is restarted from the Shopify admin.
//!
//! `state` and `timestamp` are covered by the signature but are not checked
//! against a stored nonce or a freshness window.

use axum::http::StatusCode;
use shop_bridge_core::{CallbackParams, ShopDomain, ShopDomainError};
use thiserror::Error;
use tracing::instrument;

use crate::db::StoreError;
use crate::shopify::ExchangeError;
use crate::state::AppState;

/// Errors that end an installation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The callback signature does not match.
    #[error("HMAC validation failed")]
    SignatureInvalid,

    /// A signed callback lacks a parameter the exchange needs.
    #[error("missing callback parameter: {0}")]
    MissingParameter(&'static str),

    /// The signed `shop` is not a usable host name.
    #[error("invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    /// The token endpoint did not issue a token.
    #[error("token exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    /// The token could not be persisted.
    #[error("failed to save shop token: {0}")]
    Store(#[from] StoreError),
}

impl InstallError {
    /// HTTP status for the callback response.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SignatureInvalid => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body for the callback response.
    ///
    /// Upstream detail is never included.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::SignatureInvalid => "HMAC validation failed",
            // An unconfigured store fails before any write is attempted.
            Self::Store(StoreError::Config(_)) => "Internal Server Error",
            Self::Store(_) => "Failed to save shop token",
            Self::MissingParameter(_) | Self::InvalidShop(_) | Self::Exchange(_) => {
                "Internal Server Error"
            }
        }
    }
}

/// A completed installation.
#[derive(Debug, Clone)]
pub struct InstalledShop {
    pub shop: ShopDomain,
    /// Scopes granted, if Shopify reported them.
    pub scope: Option<String>,
}

/// Run the OAuth callback for `params`.
///
/// # Errors
///
/// Returns the `InstallError` of the first step that fails. The store is
/// only written when the signature verifies and the exchange succeeds.
#[instrument(skip(state, params), fields(shop = params.shop().unwrap_or_default()))]
pub async fn complete_install(
    state: &AppState,
    params: &CallbackParams,
) -> Result<InstalledShop, InstallError> {
    if !state.shopify().verify_callback(params) {
        tracing::warn!("Invalid HMAC signature in OAuth callback");
        return Err(InstallError::SignatureInvalid);
    }

    let shop: ShopDomain = params
        .shop()
        .ok_or(InstallError::MissingParameter("shop"))?
        .parse()?;
    let code = params.code().ok_or(InstallError::MissingParameter("code"))?;

    let token = state.shopify().exchange_code(&shop, code).await?;

    state
        .store()
        .upsert_credential(&shop, token.expose())
        .await?;

    tracing::info!(scope = ?token.scope, "App installed");

    Ok(InstalledShop {
        shop,
        scope: token.scope,
    })
}
