//! First-run setup: creating the initial administrator.

use tracing::{info, warn};

use super::{AuthError, password};
use crate::models::auth::{Credential, NewCredential, Role};
use crate::store::{Store, StoreError};

/// Name given to the first admin when none is supplied.
pub const DEFAULT_ADMIN_NAME: &str = "管理員";

/// Whether the site still needs its first administrator.
///
/// An unreachable store also reports `true`; this is a hint for the UI,
/// the create path re-checks atomically.
pub async fn needs_setup(store: &Store) -> bool {
    match store.count_credentials().await {
        Ok(count) => count == 0,
        Err(e) => {
            warn!(error = %e, "credential count failed; assuming setup needed");
            true
        }
    }
}

/// Create the first administrator.
///
/// Fails with [`AuthError::SetupComplete`] once any credential exists,
/// including when a concurrent request wins the race.
pub async fn create_initial_admin(
    store: &Store,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<Credential, AuthError> {
    if store.count_credentials().await? > 0 {
        return Err(AuthError::SetupComplete);
    }

    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::ValidationError("請填寫 Email 和密碼".into()));
    }
    password::check_password_length(password)?;

    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_ADMIN_NAME);
    let password_hash = password::hash_password(password)?;

    let credential = store
        .create_initial_admin(NewCredential {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: Some(password_hash),
            role: Role::Admin,
            is_active: true,
            google_id: None,
            avatar: None,
        })
        .await
        .map_err(|e| match e {
            StoreError::SetupComplete => AuthError::SetupComplete,
            other => AuthError::Store(other),
        })?;

    info!(credential_id = %credential.id, "initial admin created");
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_store_needs_setup() {
        let store = Store::in_memory();
        assert!(needs_setup(&store).await);
    }

    #[tokio::test]
    async fn first_create_succeeds_then_locks() {
        let store = Store::in_memory();
        let admin = create_initial_admin(&store, "root@example.com", "long-enough", None)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_active);
        assert_eq!(admin.name, DEFAULT_ADMIN_NAME);
        assert!(!needs_setup(&store).await);

        let err = create_initial_admin(&store, "other@example.com", "long-enough", Some("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SetupComplete));
    }

    #[tokio::test]
    async fn validation_runs_before_insert() {
        let store = Store::in_memory();
        let err = create_initial_admin(&store, "", "long-enough", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));

        let err = create_initial_admin(&store, "a@b.com", "short", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
        assert!(needs_setup(&store).await);
    }

    #[tokio::test]
    async fn concurrent_creates_yield_one_winner() {
        let store = Store::in_memory();
        let mut handles = Vec::new();
        for i in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                create_initial_admin(&store, &format!("admin{i}@example.com"), "long-enough", None)
                    .await
            }));
        }
        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(AuthError::SetupComplete) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.count_credentials().await.unwrap(), 1);
    }
}
