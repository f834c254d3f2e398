//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - Shopify app OAuth client ID
//! - `SHOPIFY_API_SECRET` - Shopify app OAuth client secret (also the HMAC key)
//!
//! ## Required on first store access (not at startup)
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_SERVICE_ROLE_KEY` - Supabase service role key (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `FRONTEND_URL` - Embedded app frontend origin (default: <http://localhost:5173>)
//! - `SHOPIFY_APP_URL` - Public URL of this backend (default: `http://localhost:{PORT}`)
//! - `SHOPIFY_API_VERSION` - Admin API version for relayed requests (default: 2023-10)
//! - `COOKIE_SECRET` - Signed cookie secret, min 32 chars (default: development fallback)
//! - `NODE_ENV` - Deployment environment (default: development)
//! - `STORE_BACKEND` - `supabase` or `memory` (default: supabase)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};

use axum_extra::extract::cookie::Key;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_COOKIE_SECRET_LENGTH: usize = 32;
const DEFAULT_API_VERSION: &str = "2023-10";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEV_COOKIE_SECRET: &str = "dev_cookie_secret_fallback_not_for_production_use";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which credential store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Supabase `stores` table over PostgREST.
    Supabase,
    /// Process-local map. Tokens are lost on restart.
    Memory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment name (`NODE_ENV`)
    pub environment: String,
    /// Embedded app frontend origin, allowed by CORS
    pub frontend_url: String,
    /// Public URL of this backend
    pub app_url: String,
    /// Signed cookie secret
    pub cookie_secret: SecretString,
    /// Credential store selection
    pub store_backend: StoreBackend,
    /// Shopify app configuration
    pub shopify: ShopifyAppConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// OAuth client ID
    pub api_key: String,
    /// OAuth client secret; also keys the callback HMAC
    pub api_secret: SecretString,
    /// Admin API version used by the relay (e.g., 2023-10)
    pub api_version: String,
    /// Replaces `https://{shop}` as the base of every outbound Shopify URL.
    ///
    /// Never read from the environment. Tests point it at a stub server.
    pub shop_origin_override: Option<String>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("shop_origin_override", &self.shop_origin_override)
            .finish()
    }
}

impl ShopifyAppConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: get_required_env(lookup, "SHOPIFY_API_KEY")?,
            api_secret: get_required_secret(lookup, "SHOPIFY_API_SECRET")?,
            api_version: get_env_or_default(lookup, "SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            shop_origin_override: None,
        })
    }
}

/// Supabase connection settings.
///
/// Loaded lazily by the credential store on first use, never at startup.
/// Implements `Debug` manually to redact the service role key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash (e.g., <https://abc.supabase.co>)
    pub url: String,
    /// Service role key (HIGH PRIVILEGE - bypasses row level security)
    pub service_role_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseConfig {
    /// Load Supabase settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `SUPABASE_URL` or
    /// `SUPABASE_SERVICE_ROLE_KEY` is unset or empty, and
    /// `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load Supabase settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`SupabaseConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = get_required_env(&lookup, "SUPABASE_URL")?;
        let service_role_key = get_required_secret(&lookup, "SUPABASE_SERVICE_ROLE_KEY")?;

        let parsed = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_role_key,
        })
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    /// Supabase settings are deliberately not read here.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get_env_or_default(&lookup, "HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(&lookup, "PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let environment = get_env_or_default(&lookup, "NODE_ENV", DEFAULT_ENVIRONMENT);
        let frontend_url = get_env_or_default(&lookup, "FRONTEND_URL", DEFAULT_FRONTEND_URL)
            .trim_end_matches('/')
            .to_string();
        let app_url = get_optional_env(&lookup, "SHOPIFY_APP_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let cookie_secret = match get_optional_env(&lookup, "COOKIE_SECRET") {
            Some(secret) => {
                let secret = SecretString::from(secret);
                validate_cookie_secret(&secret, "COOKIE_SECRET")?;
                secret
            }
            None => SecretString::from(DEV_COOKIE_SECRET),
        };

        let store_backend = match get_env_or_default(&lookup, "STORE_BACKEND", "supabase")
            .to_ascii_lowercase()
            .as_str()
        {
            "supabase" => StoreBackend::Supabase,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_string(),
                    format!("expected 'supabase' or 'memory', got '{other}'"),
                ));
            }
        };

        let log_format = match get_env_or_default(&lookup, "LOG_FORMAT", "text")
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let shopify = ShopifyAppConfig::from_lookup(&lookup)?;
        let sentry_dsn = get_optional_env(&lookup, "SENTRY_DSN");
        let sentry_environment = get_optional_env(&lookup, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(&lookup, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(&lookup, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            environment,
            frontend_url,
            app_url,
            cookie_secret,
            store_backend,
            shopify,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether detailed error messages may be returned to clients.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }

    /// Whether the built-in development cookie secret is in use.
    #[must_use]
    pub fn uses_fallback_cookie_secret(&self) -> bool {
        self.cookie_secret.expose_secret() == DEV_COOKIE_SECRET
    }

    /// Derive the signed cookie key from `COOKIE_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if the secret is shorter than
    /// 32 bytes.
    pub fn cookie_key(&self) -> Result<Key, ConfigError> {
        validate_cookie_secret(&self.cookie_secret, "COOKIE_SECRET")?;
        Ok(Key::derive_from(self.cookie_secret.expose_secret().as_bytes()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a required environment variable.
fn get_required_env<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret<F>(lookup: &F, key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = get_required_env(lookup, key)?;
    Ok(SecretString::from(value))
}

/// Get an environment variable with a default value.
fn get_env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Validate that a cookie secret meets minimum length requirements.
fn validate_cookie_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_COOKIE_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_COOKIE_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}
