//! Authenticated passthrough to the Admin REST API.

use reqwest::header::CONTENT_TYPE;
use shop_bridge_core::ShopDomain;
use tracing::instrument;

use super::{ACCESS_TOKEN_HEADER, RelayError, ShopifyClient};

impl ShopifyClient {
    /// Build the Admin REST URL for `resource_path` on `shop`.
    #[must_use]
    pub fn admin_api_url(&self, shop: &ShopDomain, resource_path: &str) -> String {
        format!(
            "{}/admin/api/{}/{}",
            self.shop_base_url(shop),
            self.inner.api_version,
            resource_path.trim_start_matches('/')
        )
    }

    /// Issue one authenticated `GET` against the Admin REST API.
    ///
    /// `resource_path` is relative to `/admin/api/{version}/`, e.g.
    /// `products.json` or `orders.json?status=any`. The parsed JSON body is
    /// returned as-is. No pagination, caching or retry.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Http` on transport failure or timeout,
    /// `RelayError::Status` with the upstream status and body on a non-2xx
    /// response, and `RelayError::Parse` if a 2xx body is not JSON.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn relay(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        resource_path: &str,
    ) -> Result<serde_json::Value, RelayError> {
        let url = self.admin_api_url(shop, resource_path);

        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Admin API request failed");
            return Err(RelayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ShopifyAppConfig;

    fn client_for(origin: Option<String>) -> ShopifyClient {
        ShopifyClient::new(&ShopifyAppConfig {
            api_key: "test-api-key".to_string(),
            api_secret: SecretString::from("test-secret"),
            api_version: "2023-10".to_string(),
            shop_origin_override: origin,
        })
        .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("foo.myshopify.com").unwrap()
    }

    #[test]
    fn test_admin_api_url() {
        let client = client_for(None);
        assert_eq!(
            client.admin_api_url(&shop(), "products.json"),
            "https://foo.myshopify.com/admin/api/2023-10/products.json"
        );
        assert_eq!(
            client.admin_api_url(&shop(), "/shop.json"),
            "https://foo.myshopify.com/admin/api/2023-10/shop.json"
        );
    }

    #[tokio::test]
    async fn test_relay_returns_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2023-10/products.json"))
            .and(header("X-Shopify-Access-Token", "tok123"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [{ "id": 1, "title": "Snowboard" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(Some(server.uri()))
            .relay(&shop(), "tok123", "products.json")
            .await
            .unwrap();

        assert_eq!(body["products"][0]["title"], "Snowboard");
    }

    #[tokio::test]
    async fn test_relay_passes_query_string() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2023-10/orders.json"))
            .and(query_param("status", "any"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(Some(server.uri()))
            .relay(&shop(), "tok123", "orders.json?status=any")
            .await
            .unwrap();

        assert_eq!(body, json!({ "orders": [] }));
    }

    #[tokio::test]
    async fn test_relay_wraps_upstream_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2023-10/shop.json"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"errors":"[API] Invalid API key or access token"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(Some(server.uri()))
            .relay(&shop(), "bad-token", "shop.json")
            .await
            .unwrap_err();

        match err {
            RelayError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_rejects_non_json_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2023-10/shop.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(Some(server.uri()))
            .relay(&shop(), "tok123", "shop.json")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_relay_transport_error() {
        // Port 1 is reserved (tcpmux) and refuses connections.
        let err = client_for(Some("http://127.0.0.1:1".to_string()))
            .relay(&shop(), "tok123", "shop.json")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Http(_)));
    }
}
