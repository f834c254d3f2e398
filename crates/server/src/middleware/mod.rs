//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Panic catcher (500 JSON through the global error handler)
//! 4. Origin guard (500 JSON for origins outside the allow-list)
//! 5. CORS (allow-list with credentials)
//! 6. Body limit
//!
//! The stack is assembled in [`crate::server::with_middleware`].

pub mod origin;

pub use origin::{AllowedOrigins, cors_layer, origin_guard};
