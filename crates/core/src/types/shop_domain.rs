//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that cannot appear in a host name.
    #[error("shop domain contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input is a single label (no dot).
    #[error("shop domain must be a fully qualified host name")]
    NotQualified,
    /// A label is empty or starts/ends with a hyphen.
    #[error("shop domain has a malformed label")]
    MalformedLabel,
}

/// A shop's host name, e.g. `my-shop.myshopify.com`.
///
/// This is the tenant key for stored credentials and the host that token
/// exchange and relay requests are sent to, so it only admits plain host
/// names: no scheme, port, path or userinfo.
///
/// ## Constraints
///
/// - Trimmed and lowercased on parse
/// - Length: 1-255 characters
/// - Characters: `a-z`, `0-9`, `.` and `-`
/// - At least two labels, none empty, none starting or ending with `-`
///
/// ## Examples
///
/// ```
/// use shop_bridge_core::ShopDomain;
///
/// assert!(ShopDomain::parse("my-shop.myshopify.com").is_ok());
/// assert_eq!(
///     ShopDomain::parse(" My-Shop.myshopify.com ").unwrap().as_str(),
///     "my-shop.myshopify.com"
/// );
///
/// assert!(ShopDomain::parse("").is_err());                         // empty
/// assert!(ShopDomain::parse("localhost").is_err());                // single label
/// assert!(ShopDomain::parse("evil.com/admin").is_err());           // path
/// assert!(ShopDomain::parse("shop.myshopify.com:8443").is_err());  // port
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a DNS host name.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains characters
    /// outside `[a-z0-9.-]`, has a single label, or has a malformed label.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let normalized = s.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
        {
            return Err(ShopDomainError::InvalidCharacter(c));
        }

        if !normalized.contains('.') {
            return Err(ShopDomainError::NotQualified);
        }

        let malformed = normalized
            .split('.')
            .any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-'));
        if malformed {
            return Err(ShopDomainError::MalformedLabel);
        }

        Ok(Self(normalized))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(domain: ShopDomain) -> Self {
        domain.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
