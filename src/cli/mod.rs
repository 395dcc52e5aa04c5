//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod annotate;
pub mod augment;
pub mod helpers;
pub mod serve;
pub mod stats;
pub mod timeline;
