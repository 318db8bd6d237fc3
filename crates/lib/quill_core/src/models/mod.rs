//! Domain models shared by the storage backends and the HTTP layer.

pub mod auth;
pub mod content;
