//! Mapping Google identities onto local credentials.

use serde::Deserialize;
use tracing::info;

use super::AuthError;
use crate::models::auth::{Credential, CredentialUpdate, NewCredential, Role};
use crate::store::Store;

/// Subset of the Google userinfo response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

fn is_super_admin(email: &str, super_admin_email: Option<&str>) -> bool {
    super_admin_email
        .map(str::trim)
        .is_some_and(|expected| !expected.is_empty() && expected.eq_ignore_ascii_case(email.trim()))
}

/// Find or create the credential for a Google profile.
///
/// Existing accounts (matched by email) get their Google id and avatar
/// linked; the name is filled only if blank, role and active flag are left
/// alone. New accounts are inactive editors pending approval, unless the
/// email is the configured super admin.
pub async fn link_google_account(
    store: &Store,
    profile: &GoogleProfile,
    super_admin_email: Option<&str>,
) -> Result<Credential, AuthError> {
    if let Some(existing) = store.find_credential_by_email(&profile.email).await? {
        let update = CredentialUpdate {
            google_id: Some(profile.id.clone()),
            avatar: profile.picture.clone(),
            name: (existing.name.trim().is_empty() && !profile.name.is_empty())
                .then(|| profile.name.clone()),
            ..Default::default()
        };
        return Ok(store.update_credential(existing.id, &update).await?);
    }

    let admin = is_super_admin(&profile.email, super_admin_email);
    let credential = store
        .create_credential(NewCredential {
            email: profile.email.clone(),
            name: profile.name.clone(),
            password_hash: None,
            role: if admin { Role::Admin } else { Role::Editor },
            is_active: admin,
            google_id: Some(profile.id.clone()),
            avatar: profile.picture.clone(),
        })
        .await?;
    info!(
        credential_id = %credential.id,
        role = credential.role.as_str(),
        active = credential.is_active,
        "credential created from Google login"
    );
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str) -> GoogleProfile {
        GoogleProfile {
            id: "g-123".into(),
            email: email.into(),
            name: "Google Name".into(),
            picture: Some("https://img.example/a.png".into()),
        }
    }

    #[tokio::test]
    async fn new_account_is_pending_editor() {
        let store = Store::in_memory();
        let cred = link_google_account(&store, &profile("new@example.com"), Some("boss@example.com"))
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Editor);
        assert!(!cred.is_active);
        assert!(cred.password_hash.is_none());
        assert_eq!(cred.google_id.as_deref(), Some("g-123"));
    }

    #[tokio::test]
    async fn super_admin_matches_case_insensitively() {
        let store = Store::in_memory();
        let cred = link_google_account(&store, &profile("Boss@Example.com"), Some("boss@example.com"))
            .await
            .unwrap();
        assert_eq!(cred.role, Role::Admin);
        assert!(cred.is_active);
    }

    #[tokio::test]
    async fn existing_account_keeps_role_and_name() {
        let store = Store::in_memory();
        let existing = store
            .create_credential(NewCredential {
                email: "ed@example.com".into(),
                name: "Ed".into(),
                password_hash: Some("hash".into()),
                role: Role::Editor,
                is_active: false,
                google_id: None,
                avatar: None,
            })
            .await
            .unwrap();

        let cred = link_google_account(&store, &profile("ed@example.com"), Some("ed@example.com"))
            .await
            .unwrap();
        assert_eq!(cred.id, existing.id);
        assert_eq!(cred.name, "Ed");
        assert_eq!(cred.role, Role::Editor);
        assert!(!cred.is_active);
        assert_eq!(cred.google_id.as_deref(), Some("g-123"));
        assert_eq!(cred.avatar.as_deref(), Some("https://img.example/a.png"));
    }

    #[tokio::test]
    async fn blank_name_is_filled_from_google() {
        let store = Store::in_memory();
        store
            .create_credential(NewCredential {
                email: "blank@example.com".into(),
                name: String::new(),
                password_hash: None,
                role: Role::Editor,
                is_active: true,
                google_id: None,
                avatar: None,
            })
            .await
            .unwrap();
        let cred = link_google_account(&store, &profile("blank@example.com"), None)
            .await
            .unwrap();
        assert_eq!(cred.name, "Google Name");
    }
}
