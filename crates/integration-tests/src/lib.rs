//! Integration tests for Shop Bridge.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shop-bridge-integration-tests
//! ```
//!
//! Tests drive the composed router in-process with `tower::ServiceExt::oneshot`.
//! Shopify and Supabase are replaced by `wiremock` servers; no network access
//! or database is needed.
//!
//! # Test Categories
//!
//! - `oauth_callback` - install flow end to end
//! - `health` - health check
//! - `cors` - origin allow-list
//! - `error_handler` - JSON 500 for unmatched routes and panics
//! - `relay` - Admin API relay with stored credentials

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use shop_bridge_core::{CallbackParams, ShopDomain};
use shop_bridge_server::config::AppConfig;
use shop_bridge_server::db::{CredentialStore, MemoryStore, ShopCredential, StoreError};
use shop_bridge_server::server::{MiddlewareConfig, app, with_middleware};
use shop_bridge_server::shopify::{ShopifyClient, signature};
use shop_bridge_server::state::AppState;
use tower::ServiceExt;
use url::form_urlencoded;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// App client secret used by every test config.
pub const SECRET: &str = "test-secret";

/// Frontend origin allowed by the default test config.
pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Shop used across scenarios.
pub const SHOP: &str = "foo.myshopify.com";

/// Load an `AppConfig` from the minimal required variables plus `extra`.
///
/// Outbound Shopify requests go to `shopify_origin` when given.
pub fn test_config(shopify_origin: Option<String>, extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("SHOPIFY_API_KEY", "test-api-key"),
        ("SHOPIFY_API_SECRET", SECRET),
    ]
    .into_iter()
    .chain(extra.iter().copied())
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.entry("NODE_ENV".to_string())
        .or_insert_with(|| "development".to_string());

    let mut config =
        AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config should load");
    config.shopify.shop_origin_override = shopify_origin;
    config
}

/// Compose the full router for `config` and `store`.
pub fn router_with(config: AppConfig, store: Arc<dyn CredentialStore>) -> Router {
    let middleware = MiddlewareConfig::from_config(&config);
    let state = AppState::new(config, store).expect("test state should build");
    app(state, &middleware)
}

/// Wrap extra `routes` with the full middleware stack for `config`.
pub fn wrap_routes(routes: Router<AppState>, config: AppConfig) -> Router {
    let middleware = MiddlewareConfig::from_config(&config);
    let state = AppState::new(config, Arc::new(MemoryStore::new()))
        .expect("test state should build");
    with_middleware(routes, state, &middleware)
}

/// Router backed by a fresh `MemoryStore`, returned alongside it.
pub fn memory_app(shopify_origin: Option<String>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let router = router_with(test_config(shopify_origin, &[]), store.clone());
    (router, store)
}

/// Shopify client matching [`test_config`].
pub fn shopify_client(shopify_origin: Option<String>) -> ShopifyClient {
    ShopifyClient::new(&test_config(shopify_origin, &[]).shopify)
        .expect("test client should build")
}

/// URL-encoded callback query for `pairs`, signed with [`SECRET`].
pub fn signed_query(pairs: &[(&str, &str)]) -> String {
    let params: CallbackParams = pairs.iter().copied().collect();
    let hmac = signature::sign(&params, SECRET);
    query_string(params.iter().chain([("hmac", hmac.as_str())]))
}

/// URL-encode `pairs` as a query string.
pub fn query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.extend_pairs(pairs);
    query.finish()
}

/// `GET` request for `uri`.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Send one request through `router`.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("body should be JSON")
}

/// Stub token endpoint answering every exchange with `status` and `body`.
pub async fn token_endpoint(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, status, body).await;
    server
}

/// Mount a token endpoint on an existing stub server.
pub async fn mount_token_endpoint(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Parsed shop domain for [`SHOP`].
pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).expect("valid shop domain")
}

/// Store whose backend rejects every call.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl CredentialStore for FailingStore {
    async fn upsert_credential(
        &self,
        _shop: &ShopDomain,
        _access_token: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend {
            status: 503,
            body: "database unavailable".to_string(),
        })
    }

    async fn get_credential(
        &self,
        _shop: &ShopDomain,
    ) -> Result<Option<ShopCredential>, StoreError> {
        Err(StoreError::Backend {
            status: 503,
            body: "database unavailable".to_string(),
        })
    }
}
