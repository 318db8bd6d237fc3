//! Application error types.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quill_core::auth::AuthError;
use quill_core::content::ContentError;
use quill_core::store::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Message returned for every missing or rejected credential.
pub const UNAUTHORIZED: &str = "未授權";

/// Message for accounts that can only sign in through Google.
pub const GOOGLE_ONLY: &str = "此帳號使用 Google 登入，請點擊「使用 Google 登入」";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized(UNAUTHORIZED.into())
    }
}

/// Error body shared by every failing JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m),
            AppError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(m) => AppError::NotFound(m),
            StoreError::Conflict(m) => AppError::Conflict(m),
            StoreError::SetupComplete => {
                AppError::Forbidden("已完成初始設定，無法再次使用此功能".into())
            }
            StoreError::Unavailable(m) => {
                error!(detail = %m, "store unavailable");
                AppError::Unavailable("資料庫無法連線".into())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized("帳號或密碼錯誤".into()),
            AuthError::Inactive => AppError::Forbidden("此帳號已被停用".into()),
            AuthError::PasswordlessAccount => AppError::Validation(GOOGLE_ONLY.into()),
            AuthError::SetupComplete => StoreError::SetupComplete.into(),
            AuthError::TokenError(_) => AppError::unauthorized(),
            AuthError::ValidationError(m) => AppError::Validation(m),
            AuthError::NotFound(m) => AppError::NotFound(m),
            AuthError::Config(m) | AuthError::Internal(m) => AppError::Internal(m),
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Validation(m) => AppError::Validation(m),
            ContentError::NotFound(m) => AppError::NotFound(m),
            ContentError::Conflict(m) => AppError::Conflict(m),
            ContentError::Store(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejections render as `{"error": ...}` 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor with the same JSON rejections as [`ApiJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
