//! Blog content operations: posts, categories, tags and site settings.
//!
//! Handlers call these rather than the store directly so validation and
//! draft visibility live in one place.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::content::{
    Category, CategoryUpdate, NewCategory, NewPost, NewTag, Post, PostPage, PostQuery, PostStatus,
    PostUpdate, Tag,
};
use crate::store::{Store, StoreError};

/// Default page size for post listings.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Default page size for search results.
pub const DEFAULT_SEARCH_PER_PAGE: i64 = 10;

const POST_NOT_FOUND: &str = "文章不存在";
const CATEGORY_NOT_FOUND: &str = "分類不存在";
const SLUG_TAKEN: &str = "slug 已存在";

/// Content errors.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Map slug clashes and dangling references onto user-facing errors.
fn write_error(e: StoreError) -> ContentError {
    match e {
        StoreError::Conflict(_) => ContentError::Conflict(SLUG_TAKEN.into()),
        StoreError::NotFound(_) => ContentError::Validation("分類或標籤不存在".into()),
        other => ContentError::Store(other),
    }
}

fn require(fields: &[&str], message: &str) -> Result<(), ContentError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ContentError::Validation(message.into()));
    }
    Ok(())
}

fn reject_blank(value: Option<&str>, field: &str) -> Result<(), ContentError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(ContentError::Validation(format!("{field} 不可為空")))
        }
        _ => Ok(()),
    }
}

// ============================================
// Posts
// ============================================

/// List posts. Callers without a credential only ever see published posts.
pub async fn list_posts(
    store: &Store,
    query: PostQuery,
    include_drafts: bool,
) -> Result<PostPage, ContentError> {
    let mut query = query.normalized();
    if !include_drafts {
        query.status = Some(PostStatus::Published);
    }
    Ok(store.list_posts(&query).await?)
}

/// Search published posts by title, content or excerpt. A blank term
/// yields an empty page without touching the store.
pub async fn search_posts(
    store: &Store,
    term: &str,
    page: i64,
    per_page: i64,
) -> Result<PostPage, ContentError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(PostPage::empty());
    }
    let query = PostQuery {
        page,
        search: Some(term.to_string()),
        ..PostQuery::published(per_page)
    }
    .normalized();
    Ok(store.list_posts(&query).await?)
}

fn visible(post: Option<Post>, include_drafts: bool) -> Result<Post, ContentError> {
    post.filter(|p| include_drafts || p.is_published())
        .ok_or_else(|| ContentError::NotFound(POST_NOT_FOUND.into()))
}

pub async fn get_post(store: &Store, id: Uuid, include_drafts: bool) -> Result<Post, ContentError> {
    visible(store.get_post(id).await?, include_drafts)
}

pub async fn get_post_by_slug(
    store: &Store,
    slug: &str,
    include_drafts: bool,
) -> Result<Post, ContentError> {
    visible(store.get_post_by_slug(slug).await?, include_drafts)
}

pub async fn create_post(store: &Store, mut input: NewPost) -> Result<Post, ContentError> {
    require(
        &[input.title.as_str(), input.slug.as_str(), input.content.as_str()],
        "title, slug, content 為必填",
    )?;
    input.slug = input.slug.trim().to_string();

    let post = store.create_post(input).await.map_err(write_error)?;
    info!(post_id = %post.id, slug = %post.slug, status = post.status.as_str(), "post created");
    Ok(post)
}

pub async fn update_post(store: &Store, id: Uuid, mut update: PostUpdate) -> Result<Post, ContentError> {
    reject_blank(update.title.as_deref(), "title")?;
    reject_blank(update.slug.as_deref(), "slug")?;
    reject_blank(update.content.as_deref(), "content")?;
    if let Some(slug) = update.slug.as_mut() {
        *slug = slug.trim().to_string();
    }

    if store.get_post(id).await?.is_none() {
        return Err(ContentError::NotFound(POST_NOT_FOUND.into()));
    }
    let post = store.update_post(id, &update).await.map_err(write_error)?;
    info!(post_id = %post.id, "post updated");
    Ok(post)
}

pub async fn delete_post(store: &Store, id: Uuid) -> Result<(), ContentError> {
    if !store.delete_post(id).await? {
        return Err(ContentError::NotFound(POST_NOT_FOUND.into()));
    }
    info!(post_id = %id, "post deleted");
    Ok(())
}

// ============================================
// Categories & tags
// ============================================

pub async fn list_categories(store: &Store) -> Result<Vec<Category>, ContentError> {
    Ok(store.list_categories().await?)
}

pub async fn create_category(store: &Store, input: NewCategory) -> Result<Category, ContentError> {
    require(&[input.name.as_str(), input.slug.as_str()], "name, slug 為必填")?;
    let category = store.create_category(input).await.map_err(write_error)?;
    info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok(category)
}

pub async fn update_category(
    store: &Store,
    id: Uuid,
    update: CategoryUpdate,
) -> Result<Category, ContentError> {
    reject_blank(update.name.as_deref(), "name")?;
    reject_blank(update.slug.as_deref(), "slug")?;
    store
        .update_category(id, &update)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ContentError::NotFound(CATEGORY_NOT_FOUND.into()),
            other => write_error(other),
        })
}

pub async fn delete_category(store: &Store, id: Uuid) -> Result<(), ContentError> {
    if !store.delete_category(id).await? {
        return Err(ContentError::NotFound(CATEGORY_NOT_FOUND.into()));
    }
    info!(category_id = %id, "category deleted");
    Ok(())
}

pub async fn list_tags(store: &Store) -> Result<Vec<Tag>, ContentError> {
    Ok(store.list_tags().await?)
}

pub async fn create_tag(store: &Store, input: NewTag) -> Result<Tag, ContentError> {
    require(&[input.name.as_str(), input.slug.as_str()], "name, slug 為必填")?;
    Ok(store.create_tag(input).await.map_err(write_error)?)
}

// ============================================
// Site settings
// ============================================

/// Value of one setting; unset reads as the empty string.
pub async fn get_setting(store: &Store, key: &str) -> Result<String, ContentError> {
    Ok(store.get_setting(key).await?.unwrap_or_default())
}

pub async fn list_settings(store: &Store) -> Result<BTreeMap<String, String>, ContentError> {
    Ok(store.list_settings().await?)
}

/// Upsert a setting. `None` or an empty value deletes it.
pub async fn put_setting(store: &Store, key: &str, value: Option<&str>) -> Result<(), ContentError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ContentError::Validation("缺少 key".into()));
    }
    match value {
        Some(value) if !value.is_empty() => store.put_setting(key, value).await?,
        _ => store.delete_setting(key).await?,
    }
    Ok(())
}
