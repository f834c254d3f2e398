//! Shop Bridge server library.
//!
//! Brokers a Shopify app's OAuth installation and relays authenticated
//! requests to the Admin API. Exposed as a library so the CLI and the
//! integration tests share the server's code paths.
//!
//! # Security
//!
//! This crate handles HIGH PRIVILEGE credentials:
//! - The app's client secret (code exchange and callback HMAC)
//! - Per-shop offline access tokens (full Admin API for granted scopes)
//! - The Supabase service role key (bypasses row level security)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod services;
pub mod shopify;
pub mod state;
