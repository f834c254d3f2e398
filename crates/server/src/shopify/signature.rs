//! HMAC-SHA256 verification of Shopify OAuth redirects.
//!
//! Shopify signs every redirect to the app: it removes `hmac` from the query,
//! sorts the rest by key, joins them as `key=value` pairs separated by `&`,
//! and sends the lowercase hex HMAC-SHA256 of that string keyed with the
//! app's client secret.
//!
//! Values are joined as decoded, without re-escaping `&` or `=`. Escaping
//! them would change the message and break every signature that contains one.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shop_bridge_core::CallbackParams;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 of `message` keyed with `secret`.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signature Shopify would attach to `params`.
///
/// Any `hmac` already present is ignored.
#[must_use]
pub fn sign(params: &CallbackParams, secret: &str) -> String {
    compute_signature(&params.signable_message(), secret)
}

/// Verify the `hmac` parameter of an OAuth redirect.
///
/// Returns `false` when `hmac` is absent or does not match exactly. The
/// comparison is case-sensitive and constant-time.
#[must_use]
pub fn verify(params: &CallbackParams, secret: &str) -> bool {
    let Some(provided) = params.hmac() else {
        return false;
    };

    let computed = sign(params, secret);
    computed.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn params(pairs: &[(&str, &str)]) -> CallbackParams {
        pairs.iter().copied().collect()
    }

    fn signed(pairs: &[(&str, &str)]) -> CallbackParams {
        let mut p = params(pairs);
        let hmac = sign(&p, SECRET);
        p.insert("hmac", hmac);
        p
    }

    #[test]
    fn test_compute_signature_known_vector() {
        // Example from Shopify's OAuth documentation.
        let message = "code=0907a61c0c8d55e99db179b68161bc00&shop=some-shop.myshopify.com\
                       &state=0.6784241404160823&timestamp=1337178173";
        assert_eq!(
            compute_signature(message, "hush"),
            "700e2dadb827fcc8609e9d5ce208b2e9cdaab9df07390d2cbca10d7c328fc4bf"
        );
    }

    #[test]
    fn test_compute_signature_empty_key_and_message() {
        assert_eq!(
            compute_signature("", ""),
            "b613679a0814d9ec772f95d778c35fc5ff1697c493715653c6c712144292c5ad"
        );
    }

    #[test]
    fn test_verify_fixed_vector() {
        let p = params(&[
            ("shop", "foo.myshopify.com"),
            ("code", "abc"),
            (
                "hmac",
                "7cae48de7088d081eec352757b896db61831dc6896dab4ad854e7a9abd0e81aa",
            ),
        ]);
        assert!(verify(&p, SECRET));
    }

    #[test]
    fn test_verify_value_with_separators_is_not_escaped() {
        // Signed message is "code=a&b=c&shop=foo.myshopify.com".
        let p = params(&[
            ("code", "a&b=c"),
            ("shop", "foo.myshopify.com"),
            (
                "hmac",
                "529bc049a4b3e6667962b45b507bba482a7dccde20191deda2fefb4302da177d",
            ),
        ]);
        assert!(verify(&p, SECRET));
    }

    #[test]
    fn test_verify_without_hmac_is_false() {
        assert!(!verify(&params(&[]), SECRET));
        assert!(!verify(
            &params(&[("shop", "foo.myshopify.com"), ("code", "abc")]),
            SECRET
        ));
    }

    #[test]
    fn test_round_trip_all_extra_params() {
        let p = signed(&[
            ("timestamp", "1700000000"),
            ("state", "nonce-1"),
            ("shop", "foo.myshopify.com"),
            ("code", "abc"),
        ]);
        assert_eq!(
            p.hmac(),
            Some("eb8e6ddd625bca858b9104cc8cf059bb91fcbd6aa304938b17c6170f1d016029")
        );
        assert!(verify(&p, SECRET));
    }

    #[test]
    fn test_tampering_any_value_fails() {
        let original = signed(&[
            ("code", "abc"),
            ("shop", "foo.myshopify.com"),
            ("state", "nonce-1"),
            ("timestamp", "1700000000"),
        ]);

        for key in ["code", "shop", "state", "timestamp"] {
            let mut tampered = original.clone();
            let value = tampered.get(key).unwrap_or_default().to_string();
            tampered.insert(key, format!("{value}x"));
            assert!(!verify(&tampered, SECRET), "tampering {key} must fail");
        }
    }

    #[test]
    fn test_adding_or_removing_param_fails() {
        let original = signed(&[("code", "abc"), ("shop", "foo.myshopify.com")]);

        let mut added = original.clone();
        added.insert("host", "YWRtaW4uc2hvcGlmeS5jb20");
        assert!(!verify(&added, SECRET));

        let mut removed = original;
        removed.remove("code");
        assert!(!verify(&removed, SECRET));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let p = signed(&[("code", "abc"), ("shop", "foo.myshopify.com")]);
        assert!(!verify(&p, "other-secret"));
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let mut p = signed(&[("code", "abc"), ("shop", "foo.myshopify.com")]);
        let upper = p.hmac().unwrap_or_default().to_ascii_uppercase();
        p.insert("hmac", upper);
        assert!(!verify(&p, SECRET));
    }

    #[test]
    fn test_truncated_signature_fails() {
        let mut p = signed(&[("code", "abc"), ("shop", "foo.myshopify.com")]);
        let truncated = p.hmac().and_then(|h| h.get(..32)).unwrap_or_default().to_string();
        p.insert("hmac", truncated);
        assert!(!verify(&p, SECRET));
    }
}
