//! Request handlers.

pub mod admin;
pub mod api_keys;
pub mod auth;
pub mod categories;
pub mod feeds;
pub mod oauth;
pub mod posts;
pub mod settings;
pub mod tags;
pub mod uploads;
pub mod users;

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Response};
use quill_core::auth::AuthError;
use quill_core::uuid::parse_id;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Parse a path id; garbage is reported the same as a missing row.
pub(crate) fn path_id(raw: &str, not_found: &str) -> AppResult<Uuid> {
    parse_id(raw).ok_or_else(|| AppError::NotFound(not_found.into()))
}

/// A session whose credential is gone or disabled is just unauthorized.
pub(crate) fn session_rejection(e: AuthError) -> AppError {
    match e {
        AuthError::CredentialError | AuthError::Inactive => AppError::unauthorized(),
        other => other.into(),
    }
}

/// JSON 404 for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}
