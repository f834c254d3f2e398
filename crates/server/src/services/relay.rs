//! Admin API requests on behalf of an installed shop.

use shop_bridge_core::ShopDomain;
use tracing::instrument;

use crate::db::CredentialStore;
use crate::shopify::{RelayError, ShopifyClient};

/// Fetch `resource_path` from the Admin API using the stored token for `shop`.
///
/// # Errors
///
/// Returns `RelayError::NoCredential` if the shop has never been installed,
/// `RelayError::Store` if the credential lookup fails, and any error from
/// [`ShopifyClient::relay`].
#[instrument(skip(store, client), fields(shop = %shop))]
pub async fn relay_for_shop(
    store: &dyn CredentialStore,
    client: &ShopifyClient,
    shop: &ShopDomain,
    resource_path: &str,
) -> Result<serde_json::Value, RelayError> {
    let credential = store
        .get_credential(shop)
        .await?
        .ok_or_else(|| RelayError::NoCredential(shop.clone()))?;

    client
        .relay(shop, credential.expose_token(), resource_path)
        .await
}
