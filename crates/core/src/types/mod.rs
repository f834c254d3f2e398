//! Core types for Shop Bridge.
//!
//! This module provides type-safe wrappers for the OAuth install domain.

pub mod callback_params;
pub mod shop_domain;

pub use callback_params::CallbackParams;
pub use shop_domain::{ShopDomain, ShopDomainError};
