//! Admin API relay command.
//!
//! # Usage
//!
//! ```bash
//! # Fetch products for an installed shop
//! shop-bridge relay --shop my-shop.myshopify.com products.json
//!
//! # Query strings pass through unchanged
//! shop-bridge relay --shop my-shop.myshopify.com "orders.json?status=any"
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_API_KEY`, `SHOPIFY_API_SECRET` - app credentials
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2023-10)
//! - `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY` - credential store

use shop_bridge_core::{ShopDomain, ShopDomainError};
use shop_bridge_server::config::{AppConfig, ConfigError};
use shop_bridge_server::db::SupabaseStore;
use shop_bridge_server::services::relay_for_shop;
use shop_bridge_server::shopify::{RelayError, ShopifyClient};
use thiserror::Error;

/// Errors that can occur during the relay command.
#[derive(Debug, Error)]
pub enum RelayCommandError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The `--shop` argument is not a valid shop domain.
    #[error("Invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The relayed request failed.
    #[error("Relay failed: {0}")]
    Relay(#[from] RelayError),
}

/// Fetch `resource_path` for `shop` using its stored access token.
///
/// # Returns
///
/// The Admin API JSON response.
pub async fn fetch(
    shop: &str,
    resource_path: &str,
) -> Result<serde_json::Value, RelayCommandError> {
    let config = AppConfig::from_env()?;
    let shop = ShopDomain::parse(shop)?;

    let client = ShopifyClient::new(&config.shopify)?;
    let store = SupabaseStore::new();

    tracing::info!("Relaying {} for {}", resource_path, shop);
    let body = relay_for_shop(&store, &client, &shop, resource_path).await?;

    Ok(body)
}
