//! Supabase credential store over PostgREST.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shop_bridge_core::ShopDomain;
use tokio::sync::OnceCell;
use tracing::instrument;
use url::Url;

use super::{CredentialStore, ShopCredential, StoreError};
use crate::config::{ConfigError, SupabaseConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const STORES_TABLE: &str = "stores";
const CONFLICT_TARGET: &str = "shop_domain";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=minimal";

type ConfigLoader = Box<dyn Fn() -> Result<SupabaseConfig, ConfigError> + Send + Sync>;

/// Credential store backed by the Supabase `stores` table.
///
/// Construction does no I/O and reads no settings. The HTTP client and
/// [`SupabaseConfig`] are built on the first store call. A failed attempt
/// is not remembered, so a later call tries again.
pub struct SupabaseStore {
    client: OnceCell<SupabaseClient>,
    load_config: ConfigLoader,
}

struct SupabaseClient {
    http: reqwest::Client,
    table_url: Url,
    service_role_key: SecretString,
}

#[derive(Serialize)]
struct StoreRow<'a> {
    shop_domain: &'a str,
    access_token: &'a str,
}

#[derive(Deserialize)]
struct StoredRow {
    access_token: String,
}

impl SupabaseStore {
    /// Store that reads `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` from
    /// the environment on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::with_loader(SupabaseConfig::from_env)
    }

    /// Store that obtains its settings from `loader` on first use.
    #[must_use]
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<SupabaseConfig, ConfigError> + Send + Sync + 'static,
    {
        Self {
            client: OnceCell::new(),
            load_config: Box::new(loader),
        }
    }

    /// Whether the client has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&SupabaseClient, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let config = (self.load_config)()?;
                let client = SupabaseClient::new(config)?;
                tracing::info!(table_url = %client.table_url, "Supabase client initialized");
                Ok::<_, StoreError>(client)
            })
            .await
    }
}

impl Default for SupabaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SupabaseClient {
    fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let table_url = Url::parse(&format!("{}/rest/v1/{STORES_TABLE}", config.url))
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            table_url,
            service_role_key: config.service_role_key,
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let key = self.service_role_key.expose_secret();
        self.http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    fn upsert_url(&self) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("on_conflict", CONFLICT_TARGET);
        url
    }

    fn lookup_url(&self, shop: &ShopDomain) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("shop_domain", &format!("eq.{shop}"))
            .append_pair("select", "shop_domain,access_token");
        url
    }
}

/// Read a response, turning a non-2xx status into `StoreError::Backend`.
async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(StoreError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[async_trait]
impl CredentialStore for SupabaseStore {
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    async fn upsert_credential(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<(), StoreError> {
        let client = self.client().await?;

        let response = client
            .request(reqwest::Method::POST, client.upsert_url())
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&StoreRow {
                shop_domain: shop.as_str(),
                access_token,
            })
            .send()
            .await?;

        read_body(response).await?;

        tracing::debug!("Credential upserted");
        Ok(())
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn get_credential(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopCredential>, StoreError> {
        let client = self.client().await?;

        let response = client
            .request(reqwest::Method::GET, client.lookup_url(shop))
            .send()
            .await?;

        let body = read_body(response).await?;
        let rows: Vec<StoredRow> = serde_json::from_str(&body)?;

        Ok(rows.into_iter().next().map(|row| ShopCredential {
            shop_domain: shop.clone(),
            access_token: SecretString::from(row.access_token),
        }))
    }
}
