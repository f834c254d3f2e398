//! Shop Bridge Core - Shared types library.
//!
//! This crate provides the types shared by the Shop Bridge components:
//! - `server` - OAuth install broker and Admin API relay
//! - `cli` - Operator tooling (relay requests, sign test callbacks)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shop domain newtype and the ordered callback parameter map

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
