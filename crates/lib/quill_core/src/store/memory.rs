// In-memory storage implementation for dev mode and tests.
//
// One lock guards every table so multi-table operations (first-admin
// bootstrap, tag replacement) are atomic, mirroring the transactions the
// Postgres backend uses.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Result, StoreError};
use crate::models::auth::{ApiKeyRecord, Credential, CredentialUpdate, NewApiKey, NewCredential};
use crate::models::content::{
    Category, CategoryRef, CategoryUpdate, FaqItem, NewCategory, NewPost, NewTag, Post, PostPage,
    PostQuery, PostStatus, PostUpdate, Tag, TagRef,
};
use crate::uuid::uuidv7;

#[derive(Debug, Clone)]
struct PostRow {
    id: Uuid,
    slug: String,
    title: String,
    content: String,
    excerpt: String,
    summary: String,
    faq: Option<Vec<FaqItem>>,
    featured_image: Option<String>,
    status: PostStatus,
    category_id: Option<Uuid>,
    reading_time: Option<i32>,
    tag_ids: Vec<Uuid>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.published_at.unwrap_or(self.created_at), self.id)
    }
}

#[derive(Debug, Clone)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    icon: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TagRow {
    id: Uuid,
    name: String,
    slug: String,
}

#[derive(Debug, Clone)]
struct ApiKeyRow {
    record: ApiKeyRecord,
    key_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    credentials: HashMap<Uuid, Credential>,
    setup_complete: bool,
    api_keys: HashMap<Uuid, ApiKeyRow>,
    posts: HashMap<Uuid, PostRow>,
    categories: HashMap<Uuid, CategoryRow>,
    tags: HashMap<Uuid, TagRow>,
    settings: BTreeMap<String, String>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.credentials
            .values()
            .any(|c| c.email == email && Some(c.id) != except)
    }

    fn google_id_taken(&self, google_id: &str, except: Option<Uuid>) -> bool {
        self.credentials
            .values()
            .any(|c| c.google_id.as_deref() == Some(google_id) && Some(c.id) != except)
    }

    fn post_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn category_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }

    fn check_references(&self, category_id: Option<Uuid>, tag_ids: &[Uuid]) -> Result<()> {
        if let Some(id) = category_id
            && !self.categories.contains_key(&id)
        {
            return Err(StoreError::NotFound(format!("category {id}")));
        }
        if let Some(id) = tag_ids.iter().find(|id| !self.tags.contains_key(id)) {
            return Err(StoreError::NotFound(format!("tag {id}")));
        }
        Ok(())
    }

    fn assemble(&self, row: &PostRow) -> Post {
        let category = row
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| CategoryRef {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
            });
        let tags = row
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id))
            .map(|t| TagRef {
                id: t.id,
                name: t.name.clone(),
                slug: t.slug.clone(),
            })
            .collect();
        Post {
            id: row.id,
            slug: row.slug.clone(),
            title: row.title.clone(),
            content: row.content.clone(),
            excerpt: row.excerpt.clone(),
            summary: row.summary.clone(),
            faq: row.faq.clone(),
            featured_image: row.featured_image.clone(),
            status: row.status,
            category,
            tags,
            reading_time: row.reading_time,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn matches(&self, row: &PostRow, query: &PostQuery) -> bool {
        if let Some(status) = query.status
            && row.status != status
        {
            return false;
        }
        if let Some(slug) = &query.category_slug {
            let in_category = row
                .category_id
                .and_then(|id| self.categories.get(&id))
                .is_some_and(|c| &c.slug == slug);
            if !in_category {
                return false;
            }
        }
        if let Some(slug) = &query.tag_slug {
            let tagged = row
                .tag_ids
                .iter()
                .filter_map(|id| self.tags.get(id))
                .any(|t| &t.slug == slug);
            if !tagged {
                return false;
            }
        }
        if let Some(term) = &query.search {
            let term = term.to_lowercase();
            let hit = [&row.title, &row.content, &row.excerpt]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }

    fn category_post_count(&self, id: Uuid) -> i64 {
        self.posts
            .values()
            .filter(|p| p.category_id == Some(id))
            .count() as i64
    }

    fn tag_post_count(&self, id: Uuid) -> i64 {
        self.posts
            .values()
            .filter(|p| p.tag_ids.contains(&id))
            .count() as i64
    }

    fn insert_credential(&mut self, input: NewCredential) -> Result<Credential> {
        if self.email_taken(&input.email, None) {
            return Err(StoreError::Conflict("admins_email_key".into()));
        }
        if let Some(google_id) = input.google_id.as_deref()
            && self.google_id_taken(google_id, None)
        {
            return Err(StoreError::Conflict("admins_google_id_key".into()));
        }
        let now = Utc::now();
        let credential = Credential {
            id: uuidv7(),
            email: input.email,
            name: input.name,
            password_hash: input.password_hash,
            role: input.role,
            is_active: input.is_active,
            google_id: input.google_id,
            avatar: input.avatar,
            created_at: now,
            updated_at: now,
        };
        self.credentials.insert(credential.id, credential.clone());
        Ok(credential)
    }
}

/// In-memory database. All data is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // Credentials
    // ============================================

    pub async fn count_credentials(&self) -> Result<i64> {
        Ok(self.tables.read().await.credentials.len() as i64)
    }

    pub async fn list_credentials(&self) -> Result<Vec<Credential>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Credential> = tables.credentials.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    pub async fn get_credential(&self, id: Uuid) -> Result<Option<Credential>> {
        Ok(self.tables.read().await.credentials.get(&id).cloned())
    }

    pub async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let tables = self.tables.read().await;
        Ok(tables
            .credentials
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    pub async fn create_credential(&self, input: NewCredential) -> Result<Credential> {
        self.tables.write().await.insert_credential(input)
    }

    pub async fn create_initial_admin(&self, input: NewCredential) -> Result<Credential> {
        let mut tables = self.tables.write().await;
        if tables.setup_complete || !tables.credentials.is_empty() {
            return Err(StoreError::SetupComplete);
        }
        let credential = tables.insert_credential(input)?;
        tables.setup_complete = true;
        Ok(credential)
    }

    pub async fn update_credential(&self, id: Uuid, update: &CredentialUpdate) -> Result<Credential> {
        let mut tables = self.tables.write().await;
        if let Some(google_id) = &update.google_id
            && tables.google_id_taken(google_id, Some(id))
        {
            return Err(StoreError::Conflict("admins_google_id_key".into()));
        }
        let credential = tables
            .credentials
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("credential {id}")))?;
        if let Some(name) = &update.name {
            credential.name = name.clone();
        }
        if let Some(hash) = &update.password_hash {
            credential.password_hash = Some(hash.clone());
        }
        if let Some(role) = update.role {
            credential.role = role;
        }
        if let Some(active) = update.is_active {
            credential.is_active = active;
        }
        if let Some(google_id) = &update.google_id {
            credential.google_id = Some(google_id.clone());
        }
        if let Some(avatar) = &update.avatar {
            credential.avatar = Some(avatar.clone());
        }
        credential.updated_at = Utc::now();
        Ok(credential.clone())
    }

    pub async fn upsert_credential(&self, input: NewCredential) -> Result<Credential> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .credentials
            .values_mut()
            .find(|c| c.email == input.email);
        match existing {
            Some(credential) => {
                credential.name = input.name;
                credential.role = input.role;
                credential.is_active = input.is_active;
                if input.password_hash.is_some() {
                    credential.password_hash = input.password_hash;
                }
                credential.updated_at = Utc::now();
                Ok(credential.clone())
            }
            None => tables.insert_credential(input),
        }
    }

    // ============================================
    // API keys
    // ============================================

    pub async fn insert_api_key(&self, input: NewApiKey) -> Result<ApiKeyRecord> {
        let mut tables = self.tables.write().await;
        if tables.api_keys.values().any(|k| k.key_hash == input.key_hash) {
            return Err(StoreError::Conflict("api_keys_key_hash_key".into()));
        }
        let record = ApiKeyRecord {
            id: input.id,
            name: input.name,
            prefix: input.prefix,
            created_by: input.created_by,
            is_active: true,
            last_used_at: None,
            created_at: Utc::now(),
        };
        tables.api_keys.insert(
            record.id,
            ApiKeyRow {
                record: record.clone(),
                key_hash: input.key_hash,
            },
        );
        Ok(record)
    }

    pub async fn find_active_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .api_keys
            .values()
            .find(|k| k.key_hash == key_hash && k.record.is_active)
            .map(|k| k.record.clone()))
    }

    pub async fn touch_api_key(&self, id: Uuid) -> Result<()> {
        if let Some(row) = self.tables.write().await.api_keys.get_mut(&id) {
            row.record.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ApiKeyRecord> =
            tables.api_keys.values().map(|k| k.record.clone()).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    pub async fn deactivate_api_key(&self, id: Uuid) -> Result<bool> {
        match self.tables.write().await.api_keys.get_mut(&id) {
            Some(row) => {
                row.record.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ============================================
    // Posts
    // ============================================

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&PostRow> = tables
            .posts
            .values()
            .filter(|row| tables.matches(row, query))
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.sort_key()));

        let total = rows.len() as i64;
        let posts = rows
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.per_page).unwrap_or(0))
            .map(|row| tables.assemble(row))
            .collect();
        Ok(PostPage::new(posts, total, query))
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|row| tables.assemble(row)))
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .find(|row| row.slug == slug)
            .map(|row| tables.assemble(row)))
    }

    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if tables.post_slug_taken(&input.slug, None) {
            return Err(StoreError::Conflict("posts_slug_key".into()));
        }
        tables.check_references(input.category_id, &input.tag_ids)?;

        let now = Utc::now();
        let mut tag_ids = input.tag_ids;
        tag_ids.dedup();
        let row = PostRow {
            id: uuidv7(),
            slug: input.slug,
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            summary: input.summary,
            faq: input.faq,
            featured_image: input.featured_image,
            status: input.status,
            category_id: input.category_id,
            reading_time: input.reading_time,
            tag_ids,
            published_at: (input.status == PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };
        let post = tables.assemble(&row);
        tables.posts.insert(row.id, row);
        Ok(post)
    }

    pub async fn update_post(&self, id: Uuid, update: &PostUpdate) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(StoreError::NotFound(format!("post {id}")));
        }
        if let Some(slug) = &update.slug
            && tables.post_slug_taken(slug, Some(id))
        {
            return Err(StoreError::Conflict("posts_slug_key".into()));
        }
        let category_id = update.category_id.flatten();
        let tag_ids = update.tag_ids.as_deref().unwrap_or_default();
        tables.check_references(category_id, tag_ids)?;

        let Some(row) = tables.posts.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("post {id}")));
        };
        let now = Utc::now();
        if let Some(v) = &update.title {
            row.title = v.clone();
        }
        if let Some(v) = &update.slug {
            row.slug = v.clone();
        }
        if let Some(v) = &update.content {
            row.content = v.clone();
        }
        if let Some(v) = &update.excerpt {
            row.excerpt = v.clone();
        }
        if let Some(v) = &update.summary {
            row.summary = v.clone();
        }
        if let Some(v) = &update.faq {
            row.faq = v.clone();
        }
        if let Some(v) = &update.featured_image {
            row.featured_image = v.clone();
        }
        if let Some(v) = update.category_id {
            row.category_id = v;
        }
        if let Some(v) = update.reading_time {
            row.reading_time = v;
        }
        if let Some(ids) = &update.tag_ids {
            let mut ids = ids.clone();
            ids.dedup();
            row.tag_ids = ids;
        }
        if let Some(status) = update.status {
            row.status = status;
            if status == PostStatus::Published && row.published_at.is_none() {
                row.published_at = Some(now);
            }
        }
        row.updated_at = now;

        let row = row.clone();
        Ok(tables.assemble(&row))
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.posts.remove(&id).is_some())
    }

    // ============================================
    // Categories & tags
    // ============================================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Category> = tables
            .categories
            .values()
            .map(|c| Category {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
                description: c.description.clone(),
                icon: c.icon.clone(),
                post_count: tables.category_post_count(c.id),
                created_at: c.created_at,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.category_slug_taken(&input.slug, None) {
            return Err(StoreError::Conflict("categories_slug_key".into()));
        }
        let row = CategoryRow {
            id: uuidv7(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            icon: input.icon,
            created_at: Utc::now(),
        };
        let category = Category {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            description: row.description.clone(),
            icon: row.icon.clone(),
            post_count: 0,
            created_at: row.created_at,
        };
        tables.categories.insert(row.id, row);
        Ok(category)
    }

    pub async fn update_category(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &update.slug
            && tables.category_slug_taken(slug, Some(id))
        {
            return Err(StoreError::Conflict("categories_slug_key".into()));
        }
        let row = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        if let Some(v) = &update.name {
            row.name = v.clone();
        }
        if let Some(v) = &update.slug {
            row.slug = v.clone();
        }
        if let Some(v) = &update.description {
            row.description = v.clone();
        }
        if let Some(v) = &update.icon {
            row.icon = v.clone();
        }
        let row = row.clone();
        Ok(Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            post_count: tables.category_post_count(id),
            created_at: row.created_at,
        })
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(true)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Tag> = tables
            .tags
            .values()
            .map(|t| Tag {
                id: t.id,
                name: t.name.clone(),
                slug: t.slug.clone(),
                post_count: tables.tag_post_count(t.id),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    pub async fn create_tag(&self, input: NewTag) -> Result<Tag> {
        let mut tables = self.tables.write().await;
        if tables.tags.values().any(|t| t.slug == input.slug) {
            return Err(StoreError::Conflict("tags_slug_key".into()));
        }
        let row = TagRow {
            id: uuidv7(),
            name: input.name,
            slug: input.slug,
        };
        let tag = Tag {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            post_count: 0,
        };
        tables.tags.insert(row.id, row);
        Ok(tag)
    }

    // ============================================
    // Site settings
    // ============================================

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    pub async fn list_settings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.tables.read().await.settings.clone())
    }

    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        self.tables.write().await.settings.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn new_admin(email: &str) -> NewCredential {
        NewCredential {
            email: email.to_string(),
            name: "Admin".into(),
            password_hash: Some("hash".into()),
            role: Role::Admin,
            is_active: true,
            google_id: None,
            avatar: None,
        }
    }

    fn new_post(slug: &str, status: PostStatus) -> NewPost {
        NewPost {
            slug: slug.to_string(),
            title: format!("Title {slug}"),
            content: "Body text".into(),
            excerpt: String::new(),
            summary: String::new(),
            faq: None,
            featured_image: None,
            status,
            category_id: None,
            reading_time: None,
            tag_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_google_id_conflicts_on_insert() {
        let store = MemoryStore::new();
        let linked = |email: &str| NewCredential {
            google_id: Some("g-123".into()),
            ..new_admin(email)
        };
        store.create_credential(linked("a@b.com")).await.unwrap();
        let err = store.create_credential(linked("c@d.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref key) if key == "admins_google_id_key"));

        store.create_credential(new_admin("e@f.com")).await.unwrap();
        store.create_credential(new_admin("g@h.com")).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_credential(new_admin("a@b.com")).await.unwrap();
        let err = store
            .create_credential(new_admin("a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn initial_admin_only_once() {
        let store = MemoryStore::new();
        store
            .create_initial_admin(new_admin("first@b.com"))
            .await
            .unwrap();
        let err = store
            .create_initial_admin(new_admin("second@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SetupComplete));
        assert_eq!(store.count_credentials().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn publishing_stamps_once() {
        let store = MemoryStore::new();
        let post = store
            .create_post(new_post("hello", PostStatus::Draft))
            .await
            .unwrap();
        assert!(post.published_at.is_none());

        let publish = PostUpdate {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        let first = store.update_post(post.id, &publish).await.unwrap();
        let stamped = first.published_at.expect("stamped on publish");

        let again = store.update_post(post.id, &publish).await.unwrap();
        assert_eq!(again.published_at, Some(stamped));
    }

    #[tokio::test]
    async fn listing_filters_and_pages() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_post(new_post(&format!("pub-{i}"), PostStatus::Published))
                .await
                .unwrap();
        }
        store
            .create_post(new_post("draft", PostStatus::Draft))
            .await
            .unwrap();

        let query = PostQuery {
            page: 2,
            ..PostQuery::published(2)
        };
        let page = store.list_posts(&query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.posts.len(), 2);
        assert!(page.posts.iter().all(Post::is_published));
    }

    #[tokio::test]
    async fn unknown_category_reference_is_rejected() {
        let store = MemoryStore::new();
        let mut input = new_post("orphan", PostStatus::Draft);
        input.category_id = Some(uuidv7());
        let err = store.create_post(input).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_category_detaches_posts() {
        let store = MemoryStore::new();
        let category = store
            .create_category(NewCategory {
                name: "Toys".into(),
                slug: "toys".into(),
                description: String::new(),
                icon: None,
            })
            .await
            .unwrap();
        let mut input = new_post("in-cat", PostStatus::Published);
        input.category_id = Some(category.id);
        let post = store.create_post(input).await.unwrap();
        assert_eq!(post.category.as_ref().map(|c| c.id), Some(category.id));

        assert!(store.delete_category(category.id).await.unwrap());
        let post = store.get_post(post.id).await.unwrap().unwrap();
        assert!(post.category.is_none());
    }
}
