//! Callback signing command.
//!
//! Produces a query string signed the way Shopify signs OAuth redirects, for
//! exercising `/auth/callback` by hand.
//!
//! # Usage
//!
//! ```bash
//! shop-bridge sign shop=my-shop.myshopify.com code=abc123 state=nonce
//! curl "http://localhost:5000/auth/callback?$(shop-bridge sign shop=... code=...)"
//! ```

use shop_bridge_core::CallbackParams;
use shop_bridge_server::shopify::signature;
use thiserror::Error;
use url::form_urlencoded;

/// Errors that can occur during the sign command.
#[derive(Debug, Error)]
pub enum SignError {
    /// The secret environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An argument is not in `key=value` form.
    #[error("Expected key=value, got: {0}")]
    InvalidPair(String),
}

/// Sign `pairs` with the secret held in the environment variable `secret_env`.
pub fn from_env(pairs: &[String], secret_env: &str) -> Result<String, SignError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var(secret_env)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SignError::MissingEnvVar(secret_env.to_owned()))?;

    signed_query(pairs, &secret)
}

/// Build a URL-encoded query string from `key=value` pairs with `hmac` appended.
///
/// Any `hmac` pair in the input is replaced.
pub fn signed_query(pairs: &[String], secret: &str) -> Result<String, SignError> {
    let mut params = CallbackParams::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| SignError::InvalidPair(pair.clone()))?;
        params.insert(key, value);
    }

    let hmac = signature::sign(&params, secret);

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter().filter(|(key, _)| *key != "hmac") {
        query.append_pair(key, value);
    }
    query.append_pair("hmac", &hmac);

    Ok(query.finish())
}
