//! Shop Bridge - Shopify OAuth install broker.
//!
//! This binary serves the OAuth callback and health check on port 5000.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Shopify OAuth for app installation (HMAC check, code exchange)
//! - Supabase (PostgREST) for shop credentials, configured lazily
//!
//! # Security
//!
//! Holds the app's client secret and writes HIGH PRIVILEGE shop tokens.
//! Browser access is limited to the embedded frontend and the Shopify admin.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use shop_bridge_server::config::{AppConfig, LogFormat, StoreBackend};
use shop_bridge_server::db::{CredentialStore, MemoryStore, SupabaseStore};
use shop_bridge_server::server::{MiddlewareConfig, app};
use shop_bridge_server::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_bridge_server=info,tower_http=debug".into());

    let is_json = config.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if config.uses_fallback_cookie_secret() {
        tracing::warn!("COOKIE_SECRET not set, using development fallback");
    }

    // Supabase settings are read on the first store call, not here
    let store: Arc<dyn CredentialStore> = match config.store_backend {
        StoreBackend::Supabase => Arc::new(SupabaseStore::new()),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; tokens are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let middleware = MiddlewareConfig::from_config(&config);
    let state =
        AppState::new(config.clone(), store).expect("Failed to create application state");

    let app = app(state, &middleware);

    // Start server
    let addr = config.socket_addr();
    tracing::info!(
        environment = %config.environment,
        app_url = %config.app_url,
        "shop-bridge listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
