//! In-process credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use shop_bridge_core::ShopDomain;
use tokio::sync::RwLock;

use super::{CredentialStore, ShopCredential, StoreError};

/// Credential store backed by a process-local map.
///
/// Contents are lost on restart. Selected with `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    credentials: RwLock<HashMap<ShopDomain, SecretString>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shops with a stored credential.
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    /// Whether no credential is stored.
    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn upsert_credential(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<(), StoreError> {
        self.credentials
            .write()
            .await
            .insert(shop.clone(), SecretString::from(access_token));
        Ok(())
    }

    async fn get_credential(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopCredential>, StoreError> {
        Ok(self
            .credentials
            .read()
            .await
            .get(shop)
            .map(|token| ShopCredential {
                shop_domain: shop.clone(),
                access_token: token.clone(),
            }))
    }
}
