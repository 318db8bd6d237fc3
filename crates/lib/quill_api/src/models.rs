//! Request and response bodies.
//!
//! Field names are camelCase on the wire. Domain types from `quill_core`
//! are converted here so password hashes and key hashes never leave the
//! server.

use chrono::{DateTime, Utc};
use quill_core::models::auth::{ApiKeyRecord, Credential};
use quill_core::models::content::{CategoryUpdate, FaqItem, PostStatus, PostUpdate};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetupRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Identity summary returned on login and setup.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<&Credential> for SessionUser {
    fn from(c: &Credential) -> Self {
        Self {
            id: c.id,
            email: c.email.clone(),
            name: c.name.clone(),
            role: c.role.as_str().into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    pub need_setup: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub google_id: Option<String>,
    pub avatar: Option<String>,
}

impl From<Credential> for MeResponse {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            role: c.role.as_str().into(),
            google_id: c.google_id,
            avatar: c.avatar,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub google_id: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for UserView {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            role: c.role.as_str().into(),
            is_active: c.is_active,
            google_id: c.google_id,
            avatar: c.avatar,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

/// Loosely typed so unknown values count as "no valid field" rather than a
/// parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub is_active: Option<serde_json::Value>,
    pub role: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub prefix: String,
    /// Full key. Returned only here.
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyView {
    pub id: Uuid,
    pub name: String,
    pub prefix: String,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyRecord> for ApiKeyView {
    fn from(k: ApiKeyRecord) -> Self {
        Self {
            id: k.id,
            name: k.name,
            prefix: k.prefix,
            is_active: k.is_active,
            last_used_at: k.last_used_at,
            created_at: k.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiKeyListResponse {
    pub keys: Vec<ApiKeyView>,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
    pub q: String,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub summary: Option<String>,
    pub faq: Option<Vec<FaqItem>>,
    pub featured_image: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<Uuid>,
    pub reading_time: Option<i32>,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub summary: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub faq: Option<Option<Vec<FaqItem>>>,
    #[serde(deserialize_with = "double_option")]
    pub featured_image: Option<Option<String>>,
    pub status: Option<PostStatus>,
    #[serde(deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(deserialize_with = "double_option")]
    pub reading_time: Option<Option<i32>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl From<UpdatePostRequest> for PostUpdate {
    fn from(r: UpdatePostRequest) -> Self {
        PostUpdate {
            title: r.title,
            slug: r.slug,
            content: r.content,
            excerpt: r.excerpt,
            summary: r.summary,
            faq: r.faq,
            featured_image: r.featured_image,
            status: r.status,
            category_id: r.category_id,
            reading_time: r.reading_time,
            tag_ids: r.tag_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Categories, tags, settings
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}

impl From<UpdateCategoryRequest> for CategoryUpdate {
    fn from(r: UpdateCategoryRequest) -> Self {
        CategoryUpdate {
            name: r.name,
            slug: r.slug,
            description: r.description,
            icon: r.icon,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTagRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingParams {
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PutSettingRequest {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}
