//! Issued API keys and the shared agent key.
//!
//! An issued key is a signed token; the database keeps only its SHA-256
//! hash so individual keys can be looked up and revoked.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthError, jwt};
use crate::models::auth::{ApiKeyRecord, NewApiKey};
use crate::store::Store;
use crate::uuid::uuidv7;

/// Number of leading characters kept for display.
pub const PREFIX_LEN: usize = 8;

/// SHA-256 hex digest of a presented key.
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison against the configured agent key.
///
/// An unset or empty agent key never matches.
pub fn matches_static_key(presented: &str, configured: Option<&str>) -> bool {
    match configured {
        Some(expected) if !expected.is_empty() => {
            presented.as_bytes().ct_eq(expected.as_bytes()).into()
        }
        _ => false,
    }
}

/// Create a named key. Returns the full key (shown once) and its record.
pub async fn create_api_key(
    store: &Store,
    name: &str,
    created_by: Option<Uuid>,
    secret: &[u8],
) -> Result<(String, ApiKeyRecord), AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::ValidationError("請提供 API Key 名稱".into()));
    }

    let id = uuidv7();
    let key = jwt::issue_api_key_token(&id.to_string(), name, secret)?;
    let record = store
        .insert_api_key(NewApiKey {
            id,
            name: name.to_string(),
            prefix: key.chars().take(PREFIX_LEN).collect(),
            key_hash: hash_api_key(&key),
            created_by,
        })
        .await?;

    info!(key_id = %record.id, name = %record.name, "API key created");
    Ok((key, record))
}

/// Resolve a presented key to its active record.
///
/// The token must verify and its hash must match an active row; the row's
/// `last_used_at` is then touched.
pub async fn validate_api_key(
    store: &Store,
    presented: &str,
    secret: &[u8],
) -> Result<Option<ApiKeyRecord>, AuthError> {
    let Some(claims) = jwt::verify_api_key_token(presented, secret) else {
        return Ok(None);
    };
    let Some(record) = store
        .find_active_api_key_by_hash(&hash_api_key(presented))
        .await?
    else {
        debug!(key_id = %claims.sub, "API key not active");
        return Ok(None);
    };
    if record.id.to_string() != claims.sub {
        return Ok(None);
    }
    store.touch_api_key(record.id).await?;
    Ok(Some(record))
}

pub async fn list_api_keys(store: &Store) -> Result<Vec<ApiKeyRecord>, AuthError> {
    Ok(store.list_api_keys().await?)
}

/// Soft-disable a key.
pub async fn revoke_api_key(store: &Store, id: Uuid) -> Result<(), AuthError> {
    if !store.deactivate_api_key(id).await? {
        return Err(AuthError::NotFound("API Key 不存在".into()));
    }
    info!(key_id = %id, "API key revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn hash_is_stable_hex() {
        let a = hash_api_key("some-key");
        assert_eq!(a, hash_api_key("some-key"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_api_key("some-key2"));
    }

    #[test]
    fn static_key_comparison() {
        assert!(matches_static_key("agent-key", Some("agent-key")));
        assert!(!matches_static_key("agent-kez", Some("agent-key")));
        assert!(!matches_static_key("agent", Some("agent-key")));
        assert!(!matches_static_key("", Some("")));
        assert!(!matches_static_key("anything", None));
    }

    #[tokio::test]
    async fn created_key_validates_until_revoked() {
        let store = Store::in_memory();
        let (key, record) = create_api_key(&store, " agent ", None, SECRET)
            .await
            .unwrap();
        assert_eq!(record.name, "agent");
        assert_eq!(record.prefix, key.chars().take(PREFIX_LEN).collect::<String>());

        let found = validate_api_key(&store, &key, SECRET).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(record.id));
        let listed = list_api_keys(&store).await.unwrap();
        assert!(listed[0].last_used_at.is_some());

        revoke_api_key(&store, record.id).await.unwrap();
        assert!(validate_api_key(&store, &key, SECRET).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = Store::in_memory();
        let err = create_api_key(&store, "   ", None, SECRET).await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[tokio::test]
    async fn session_token_is_not_an_api_key() {
        let store = Store::in_memory();
        let session = jwt::issue_session("cred", crate::models::auth::Role::Admin, SECRET).unwrap();
        assert!(validate_api_key(&store, &session, SECRET).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoking_unknown_key_is_not_found() {
        let store = Store::in_memory();
        let err = revoke_api_key(&store, uuidv7()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
