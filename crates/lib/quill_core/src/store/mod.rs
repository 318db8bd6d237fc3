//! Storage backends.
//!
//! `Store` is either PostgreSQL (production) or an in-memory database
//! (development and tests). Enum dispatch keeps the call sites free of
//! generics and trait objects.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{ApiKeyRecord, Credential, CredentialUpdate, NewApiKey, NewCredential};
use crate::models::content::{
    Category, CategoryUpdate, NewCategory, NewPost, NewTag, Post, PostPage, PostQuery, PostUpdate,
    Tag,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("setup already complete")]
    SetupComplete,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt row: {0}")]
    Decode(String),

    #[error("SQL error: {0}")]
    Sql(sqlx::Error),
}

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".into()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
            {
                StoreError::NotFound(db.constraint().unwrap_or("reference").to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Sql(e),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage backend that can be either PostgreSQL or in-memory.
#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(Arc<MemoryStore>),
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match $self {
            Store::Postgres(db) => db.$method($($arg),*).await,
            Store::Memory(db) => db.$method($($arg),*).await,
        }
    };
}

impl Store {
    /// PostgreSQL backend over an existing pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PgStore::new(pool))
    }

    /// Fresh, empty in-memory backend.
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::new()))
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Close underlying connections. A no-op for the in-memory backend.
    pub async fn close(&self) {
        if let Self::Postgres(db) = self {
            db.pool().close().await;
        }
    }

    // ============================================
    // Credentials
    // ============================================

    pub async fn count_credentials(&self) -> Result<i64> {
        dispatch!(self.count_credentials())
    }

    pub async fn list_credentials(&self) -> Result<Vec<Credential>> {
        dispatch!(self.list_credentials())
    }

    pub async fn get_credential(&self, id: Uuid) -> Result<Option<Credential>> {
        dispatch!(self.get_credential(id))
    }

    pub async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        dispatch!(self.find_credential_by_email(email))
    }

    pub async fn create_credential(&self, input: NewCredential) -> Result<Credential> {
        dispatch!(self.create_credential(input))
    }

    /// Insert the first administrator, failing with
    /// [`StoreError::SetupComplete`] if any credential or setup marker exists.
    pub async fn create_initial_admin(&self, input: NewCredential) -> Result<Credential> {
        dispatch!(self.create_initial_admin(input))
    }

    pub async fn update_credential(&self, id: Uuid, update: &CredentialUpdate) -> Result<Credential> {
        dispatch!(self.update_credential(id, update))
    }

    /// Insert or, matching on email, overwrite name, role, password and
    /// re-activate.
    pub async fn upsert_credential(&self, input: NewCredential) -> Result<Credential> {
        dispatch!(self.upsert_credential(input))
    }

    // ============================================
    // API keys
    // ============================================

    pub async fn insert_api_key(&self, input: NewApiKey) -> Result<ApiKeyRecord> {
        dispatch!(self.insert_api_key(input))
    }

    pub async fn find_active_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>> {
        dispatch!(self.find_active_api_key_by_hash(key_hash))
    }

    pub async fn touch_api_key(&self, id: Uuid) -> Result<()> {
        dispatch!(self.touch_api_key(id))
    }

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        dispatch!(self.list_api_keys())
    }

    /// Soft-disable a key. Returns `false` if no such key exists.
    pub async fn deactivate_api_key(&self, id: Uuid) -> Result<bool> {
        dispatch!(self.deactivate_api_key(id))
    }

    // ============================================
    // Posts
    // ============================================

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        dispatch!(self.list_posts(query))
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        dispatch!(self.get_post(id))
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        dispatch!(self.get_post_by_slug(slug))
    }

    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        dispatch!(self.create_post(input))
    }

    pub async fn update_post(&self, id: Uuid, update: &PostUpdate) -> Result<Post> {
        dispatch!(self.update_post(id, update))
    }

    /// Returns `false` if no such post exists.
    pub async fn delete_post(&self, id: Uuid) -> Result<bool> {
        dispatch!(self.delete_post(id))
    }

    // ============================================
    // Categories & tags
    // ============================================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        dispatch!(self.list_categories())
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category> {
        dispatch!(self.create_category(input))
    }

    pub async fn update_category(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category> {
        dispatch!(self.update_category(id, update))
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<bool> {
        dispatch!(self.delete_category(id))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        dispatch!(self.list_tags())
    }

    pub async fn create_tag(&self, input: NewTag) -> Result<Tag> {
        dispatch!(self.create_tag(input))
    }

    // ============================================
    // Site settings
    // ============================================

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        dispatch!(self.get_setting(key))
    }

    pub async fn list_settings(&self) -> Result<BTreeMap<String, String>> {
        dispatch!(self.list_settings())
    }

    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        dispatch!(self.put_setting(key, value))
    }

    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        dispatch!(self.delete_setting(key))
    }
}
