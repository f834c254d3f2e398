//! Shopify client for the app's OAuth install flow and Admin REST relay.
//!
//! # Security
//!
//! The client holds the app's client secret, which both authenticates the
//! code exchange and keys the callback HMAC. Relayed requests carry per-shop
//! access tokens with full Admin API access for the granted scopes.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_bridge_server::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! if client.verify_callback(&params) {
//!     let token = client.exchange_code(&shop, code).await?;
//!     let products = client.relay(&shop, token.expose(), "products.json").await?;
//! }
//! ```

pub mod signature;
mod oauth;
mod relay;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use shop_bridge_core::{CallbackParams, ShopDomain};
use thiserror::Error;

use crate::config::ShopifyAppConfig;

pub use oauth::AccessToken;

/// Timeout applied to every outbound Shopify request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the shop access token on Admin API requests.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Errors from exchanging an authorization code for an access token.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response body had no usable `access_token`.
    #[error("Token endpoint response has no access_token")]
    MissingToken,
}

/// Errors from relaying a request to the Admin API.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Admin API answered with a non-2xx status.
    #[error("Admin API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A 2xx response whose body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No credential is stored for the shop.
    #[error("No stored credential for shop {0}")]
    NoCredential(ShopDomain),

    /// Loading the credential failed.
    #[error("Credential store error: {0}")]
    Store(#[from] crate::db::StoreError),
}

/// Shopify client shared by all handlers.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    shop_origin_override: Option<String>,
}

impl ShopifyClient {
    /// Create a new Shopify client.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                api_version: config.api_version.clone(),
                shop_origin_override: config
                    .shop_origin_override
                    .as_ref()
                    .map(|origin| origin.trim_end_matches('/').to_string()),
            }),
        })
    }

    /// Check the `hmac` of an OAuth callback against the app secret.
    #[must_use]
    pub fn verify_callback(&self, params: &CallbackParams) -> bool {
        signature::verify(params, self.inner.api_secret.expose_secret())
    }

    /// Base URL for requests to a shop: `https://{shop}` unless overridden.
    fn shop_base_url(&self, shop: &ShopDomain) -> String {
        self.inner
            .shop_origin_override
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(origin: Option<&str>) -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_key: "test-api-key".to_string(),
            api_secret: SecretString::from("hush"),
            api_version: "2023-10".to_string(),
            shop_origin_override: origin.map(String::from),
        }
    }

    #[test]
    fn test_shop_base_url() {
        let client = ShopifyClient::new(&config(None)).unwrap();
        let shop = ShopDomain::parse("foo.myshopify.com").unwrap();
        assert_eq!(client.shop_base_url(&shop), "https://foo.myshopify.com");
    }

    #[test]
    fn test_shop_base_url_override() {
        let client = ShopifyClient::new(&config(Some("http://127.0.0.1:9999/"))).unwrap();
        let shop = ShopDomain::parse("foo.myshopify.com").unwrap();
        assert_eq!(client.shop_base_url(&shop), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_verify_callback_uses_app_secret() {
        let client = ShopifyClient::new(&config(None)).unwrap();
        let mut params: CallbackParams = [
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("shop", "some-shop.myshopify.com"),
            ("state", "0.6784241404160823"),
            ("timestamp", "1337178173"),
        ]
        .into_iter()
        .collect();
        params.insert(
            "hmac",
            "700e2dadb827fcc8609e9d5ce208b2e9cdaab9df07390d2cbca10d7c328fc4bf",
        );

        assert!(client.verify_callback(&params));
    }

    #[test]
    fn test_exchange_error_display() {
        let err = ExchangeError::Status {
            status: 400,
            body: "invalid code".to_string(),
        };
        assert_eq!(err.to_string(), "Token endpoint returned 400: invalid code");
        assert_eq!(
            ExchangeError::MissingToken.to_string(),
            "Token endpoint response has no access_token"
        );
    }

    #[test]
    fn test_relay_error_display() {
        let err = RelayError::NoCredential(ShopDomain::parse("foo.myshopify.com").unwrap());
        assert_eq!(err.to_string(), "No stored credential for shop foo.myshopify.com");
    }
}
