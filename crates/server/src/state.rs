//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::{AppConfig, ConfigError};
use crate::db::CredentialStore;
use crate::shopify::ShopifyClient;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The credential store is
/// injected so tests and local development can swap the backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    shopify: ShopifyClient,
    store: Arc<dyn CredentialStore>,
    cookie_key: Key,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Does no I/O. A lazily configured store stays unconfigured until the
    /// first callback reaches it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie secret is too short or the Shopify
    /// HTTP client cannot be built.
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let cookie_key = config.cookie_key()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                store,
                cookie_key,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.inner.store.as_ref()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.inner.cookie_key.clone()
    }
}
