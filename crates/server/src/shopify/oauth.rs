//! Authorization code exchange.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shop_bridge_core::ShopDomain;
use tracing::instrument;

use super::{ExchangeError, ShopifyClient};

/// An offline access token issued for a shop.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AccessToken {
    /// The access token for Admin API calls (HIGH PRIVILEGE).
    pub access_token: SecretString,
    /// Granted scopes, comma separated, if Shopify reported them.
    pub scope: Option<String>,
}

impl AccessToken {
    /// The raw token, for handing to the store or an outbound request.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Body of the token request.
#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// OAuth token response from Shopify.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    scope: Option<String>,
}

impl ShopifyClient {
    /// Exchange an authorization code for an access token.
    ///
    /// Sends one `POST https://{shop}/admin/oauth/access_token`. There is no
    /// retry: Shopify invalidates the code once it has been presented.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Http` if the request fails or times out,
    /// `ExchangeError::Status` on a non-2xx response, and
    /// `ExchangeError::Parse` / `ExchangeError::MissingToken` if the body
    /// carries no access token.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessToken, ExchangeError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_base_url(shop));

        let body = AccessTokenRequest {
            client_id: &self.inner.api_key,
            client_secret: self.inner.api_secret.expose_secret(),
            code,
        };

        let response = self.inner.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let token_response: AccessTokenResponse = serde_json::from_str(&text)?;

        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(ExchangeError::MissingToken)?;

        tracing::debug!(scope = ?token_response.scope, "Access token issued");

        Ok(AccessToken {
            access_token: SecretString::from(access_token),
            scope: token_response.scope,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ShopifyAppConfig;

    fn client_for(server: &MockServer) -> ShopifyClient {
        ShopifyClient::new(&ShopifyAppConfig {
            api_key: "test-api-key".to_string(),
            api_secret: SecretString::from("test-secret"),
            api_version: "2023-10".to_string(),
            shop_origin_override: Some(server.uri()),
        })
        .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("foo.myshopify.com").unwrap()
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "client_id": "test-api-key",
                "client_secret": "test-secret",
                "code": "auth-code-123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok123",
                "scope": "read_products,write_orders"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server)
            .exchange_code(&shop(), "auth-code-123")
            .await
            .unwrap();

        assert_eq!(token.expose(), "tok123");
        assert_eq!(token.scope.as_deref(), Some("read_products,write_orders"));
    }

    #[tokio::test]
    async fn test_exchange_code_without_scope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok123"
            })))
            .mount(&server)
            .await;

        let token = client_for(&server)
            .exchange_code(&shop(), "code")
            .await
            .unwrap();

        assert_eq!(token.expose(), "tok123");
        assert!(token.scope.is_none());
    }

    #[tokio::test]
    async fn test_exchange_code_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange_code(&shop(), "code")
            .await
            .unwrap_err();

        match err {
            ExchangeError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_missing_token_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "scope": "read_products" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange_code(&shop(), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::MissingToken));
    }

    #[tokio::test]
    async fn test_exchange_code_empty_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "" })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange_code(&shop(), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::MissingToken));
    }

    #[tokio::test]
    async fn test_exchange_code_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange_code(&shop(), "code")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_is_attempted_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).exchange_code(&shop(), "code").await;
        assert!(result.is_err());
        // `expect(1)` is verified when the server drops.
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken {
            access_token: SecretString::from("shpat_super_secret"),
            scope: Some("read_products".to_string()),
        };
        let debug_output = format!("{token:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_super_secret"));
    }
}
