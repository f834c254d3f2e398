//! Business logic services.
//!
//! # Services
//!
//! - `install` - OAuth callback: verify, exchange, persist
//! - `relay` - Admin API requests for a shop with a stored credential

pub mod install;
pub mod relay;

pub use install::{InstallError, InstalledShop, complete_install};
pub use relay::relay_for_shop;
