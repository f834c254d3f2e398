//! Ordered query parameters of an OAuth callback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query parameters carried by a Shopify redirect (`shop`, `code`, `hmac`,
/// `timestamp`, `state`, `host`, ...).
///
/// Backed by a `BTreeMap`, so iteration is always in ascending byte order of
/// the keys no matter how the URL ordered them. The signable message is
/// derived from that order.
///
/// Values are stored decoded, exactly as they came out of the query string
/// parser, and are joined verbatim: a value containing `&` or `=` is not
/// escaped, matching the way Shopify computes the signature.
///
/// ```
/// use shop_bridge_core::CallbackParams;
///
/// let params: CallbackParams = [
///     ("shop", "foo.myshopify.com"),
///     ("hmac", "abc"),
///     ("code", "xyz"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(params.signable_message(), "code=xyz&shop=foo.myshopify.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackParams(BTreeMap<String, String>);

impl CallbackParams {
    /// Name of the signature parameter.
    pub const HMAC_KEY: &'static str = "hmac";

    /// Create an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The supplied signature, if any.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get(Self::HMAC_KEY)
    }

    /// The `shop` parameter.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// The one-time authorization `code`.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// Number of parameters, including `hmac`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the message that is signed: every parameter except `hmac`,
    /// sorted by key, rendered as `key=value` and joined with `&`.
    #[must_use]
    pub fn signable_message(&self) -> String {
        self.iter()
            .filter(|(key, _)| *key != Self::HMAC_KEY)
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for CallbackParams {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
