//! Axum middleware.

pub mod gate;
