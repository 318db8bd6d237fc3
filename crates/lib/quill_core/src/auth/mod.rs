//! Authentication and authorization logic.
//!
//! Provides password hashing, session and API-key tokens, the first-run
//! setup guard, password login and Google account linking, shared by
//! `quill_api` and `quill_cli`.

pub mod api_keys;
pub mod jwt;
pub mod login;
pub mod oauth;
pub mod password;
pub mod setup;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Account is disabled")]
    Inactive,

    #[error("Account has no password; sign in with Google")]
    PasswordlessAccount,

    #[error("Setup already complete")]
    SetupComplete,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
