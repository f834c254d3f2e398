//! CLI subcommands.

pub mod relay;
pub mod sign;
