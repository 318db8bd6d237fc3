//! # quill_core
//!
//! Core domain logic for Quill: credentials and sessions, API keys, blog
//! content, and the storage backends behind them.

pub mod auth;
pub mod content;
pub mod feed;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
