//! Shop credential persistence.
//!
//! # Backends
//!
//! - [`SupabaseStore`] - `stores` table in Supabase, over its PostgREST API.
//!   Settings are read on first use, not at startup.
//! - [`MemoryStore`] - process-local map for tests and local development.
//!
//! # Table: `stores`
//!
//! | Column | Notes |
//! |---|---|
//! | `shop_domain` | unique, upsert conflict target |
//! | `access_token` | offline Admin API token |

mod memory;
mod supabase;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use shop_bridge_core::ShopDomain;
use thiserror::Error;

use crate::config::ConfigError;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Errors that can occur during credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store settings missing or invalid when first needed.
    #[error("store not configured: {0}")]
    Config(#[from] ConfigError),

    /// Transport failure talking to the backend.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request (e.g., constraint violation).
    #[error("store backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// Backend response could not be decoded.
    #[error("unexpected store response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A stored shop credential.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopCredential {
    /// Shop domain (e.g., your-store.myshopify.com).
    pub shop_domain: ShopDomain,
    /// OAuth access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
}

impl ShopCredential {
    /// The raw token, for an outbound Admin API request.
    #[must_use]
    pub fn expose_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for ShopCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredential")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Store and read shop credentials keyed by shop domain.
///
/// At most one credential exists per shop. Writing again replaces it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert the credential for `shop`, or overwrite the existing one.
    async fn upsert_credential(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<(), StoreError>;

    /// Look up the credential for `shop`.
    async fn get_credential(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopCredential>, StoreError>;
}
