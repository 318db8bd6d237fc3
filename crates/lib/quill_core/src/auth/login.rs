//! Password login and credential lookups used by the HTTP layer.

use tracing::debug;
use uuid::Uuid;

use super::{AuthError, password};
use crate::models::auth::Credential;
use crate::store::Store;

/// Check an email/password pair.
///
/// Order: missing fields, unknown email, inactive account, Google-only
/// account, wrong password.
pub async fn authenticate(
    store: &Store,
    email: &str,
    password: &str,
) -> Result<Credential, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::ValidationError("請輸入帳號和密碼".into()));
    }

    let Some(credential) = store.find_credential_by_email(email).await? else {
        debug!("login for unknown email");
        return Err(AuthError::CredentialError);
    };
    if !credential.is_active {
        return Err(AuthError::Inactive);
    }
    let Some(hash) = credential.password_hash.as_deref() else {
        return Err(AuthError::PasswordlessAccount);
    };
    if !password::verify_password(password, hash)? {
        debug!(credential_id = %credential.id, "login with wrong password");
        return Err(AuthError::CredentialError);
    }
    Ok(credential)
}

/// Fetch a credential by the `sub` of a session, requiring it to be active.
pub async fn active_credential(store: &Store, subject: &str) -> Result<Credential, AuthError> {
    let id = Uuid::parse_str(subject).map_err(|_| AuthError::CredentialError)?;
    match store.get_credential(id).await? {
        Some(credential) if credential.is_active => Ok(credential),
        Some(_) => Err(AuthError::Inactive),
        None => Err(AuthError::CredentialError),
    }
}
