//! PostgreSQL storage.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{Result, StoreError};
use crate::models::auth::{
    ApiKeyRecord, Credential, CredentialUpdate, NewApiKey, NewCredential, Role,
};
use crate::models::content::{
    Category, CategoryRef, CategoryUpdate, FaqItem, NewCategory, NewPost, NewTag, Post, PostPage,
    PostQuery, PostStatus, PostUpdate, Tag, TagRef,
};
use crate::uuid::uuidv7;

const CREDENTIAL_COLUMNS: &str = "id, email, name, password_hash, role, is_active, google_id, \
                                  avatar, created_at, updated_at";

const API_KEY_COLUMNS: &str = "id, name, prefix, created_by, is_active, last_used_at, created_at";

const POST_SELECT: &str = r#"
    SELECT p.id, p.slug, p.title, p.content, p.excerpt, p.summary, p.faq,
           p.featured_image, p.status, p.reading_time, p.published_at,
           p.created_at, p.updated_at,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM posts p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

// Shared by the count and page queries of `list_posts`.
const POST_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR p.status = $1)
      AND ($2::text IS NULL OR c.slug = $2)
      AND ($3::text IS NULL OR EXISTS (
            SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = p.id AND t.slug = $3))
      AND ($4::text IS NULL OR p.title ILIKE $4 OR p.content ILIKE $4 OR p.excerpt ILIKE $4)
"#;

const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.name, c.slug, c.description, c.icon, c.created_at,
           (SELECT COUNT(*) FROM posts p WHERE p.category_id = c.id) AS post_count
    FROM categories c
"#;

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    google_id: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Decode(format!("admins.role = {:?}", row.role)))?;
        Ok(Credential {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role,
            is_active: row.is_active,
            google_id: row.google_id,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    id: Uuid,
    name: String,
    prefix: String,
    created_by: Option<Uuid>,
    is_active: bool,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKeyRecord {
    fn from(row: ApiKeyRow) -> Self {
        ApiKeyRecord {
            id: row.id,
            name: row.name,
            prefix: row.prefix,
            created_by: row.created_by,
            is_active: row.is_active,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    slug: String,
    title: String,
    content: String,
    excerpt: String,
    summary: String,
    faq: Option<Json<Vec<FaqItem>>>,
    featured_image: Option<String>,
    status: String,
    reading_time: Option<i32>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl PostRow {
    fn into_post(self, tags: Vec<TagRef>) -> Result<Post> {
        let status = PostStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Decode(format!("posts.status = {:?}", self.status)))?;
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef { id, name, slug }),
            _ => None,
        };
        Ok(Post {
            id: self.id,
            slug: self.slug,
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            summary: self.summary,
            faq: self.faq.map(|Json(items)| items),
            featured_image: self.featured_image,
            status,
            category,
            tags,
            reading_time: self.reading_time,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    icon: Option<String>,
    created_at: DateTime<Utc>,
    post_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            post_count: row.post_count,
            created_at: row.created_at,
        }
    }
}

/// Escape `%`, `_` and `\` and wrap in wildcards for ILIKE.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Credentials
    // ============================================

    pub async fn count_credentials(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_credentials(&self) -> Result<Vec<Credential>> {
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM admins ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Credential::try_from).collect()
    }

    pub async fn get_credential(&self, id: Uuid) -> Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Credential::try_from).transpose()
    }

    pub async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Credential::try_from).transpose()
    }

    pub async fn create_credential(&self, input: NewCredential) -> Result<Credential> {
        insert_credential(&self.pool, input).await
    }

    pub async fn create_initial_admin(&self, input: NewCredential) -> Result<Credential> {
        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM setup_marker) OR EXISTS (SELECT 1 FROM admins)",
        )
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(StoreError::SetupComplete);
        }

        // A concurrent bootstrap blocks on the email index or the singleton
        // key and then fails with a unique violation once the winner commits.
        let credential = insert_credential(&mut *tx, input)
            .await
            .map_err(lost_setup_race)?;

        sqlx::query("INSERT INTO setup_marker (admin_id) VALUES ($1)")
            .bind(credential.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| lost_setup_race(e.into()))?;

        tx.commit().await?;
        Ok(credential)
    }

    pub async fn update_credential(&self, id: Uuid, update: &CredentialUpdate) -> Result<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"
            UPDATE admins SET
                name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                google_id = COALESCE($6, google_id),
                avatar = COALESCE($7, avatar),
                updated_at = now()
            WHERE id = $1
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.password_hash.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.is_active)
        .bind(update.google_id.as_deref())
        .bind(update.avatar.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("credential {id}")))?;
        Credential::try_from(row)
    }

    pub async fn upsert_credential(&self, input: NewCredential) -> Result<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"
            INSERT INTO admins (id, email, name, password_hash, role, is_active, google_id, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                is_active = EXCLUDED.is_active,
                password_hash = COALESCE(EXCLUDED.password_hash, admins.password_hash),
                updated_at = now()
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        ))
        .bind(uuidv7())
        .bind(&input.email)
        .bind(&input.name)
        .bind(input.password_hash.as_deref())
        .bind(input.role.as_str())
        .bind(input.is_active)
        .bind(input.google_id.as_deref())
        .bind(input.avatar.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Credential::try_from(row)
    }

    // ============================================
    // API keys
    // ============================================

    pub async fn insert_api_key(&self, input: NewApiKey) -> Result<ApiKeyRecord> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            r#"
            INSERT INTO api_keys (id, name, prefix, key_hash, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(&input.name)
        .bind(&input.prefix)
        .bind(&input.key_hash)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn find_active_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE key_hash = $1 AND is_active"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn touch_api_key(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn deactivate_api_key(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE api_keys SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Posts
    // ============================================

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        let status = query.status.map(|s| s.as_str());
        let search = query.search.as_deref().map(like_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id {POST_FILTER}"
        ))
        .bind(status)
        .bind(query.category_slug.as_deref())
        .bind(query.tag_slug.as_deref())
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT} {POST_FILTER} \
             ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC \
             LIMIT $5 OFFSET $6"
        ))
        .bind(status)
        .bind(query.category_slug.as_deref())
        .bind(query.tag_slug.as_deref())
        .bind(search.as_deref())
        .bind(query.per_page)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let posts = self.attach_tags(rows).await?;
        Ok(PostPage::new(posts, total, query))
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        let id = uuidv7();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, slug, title, content, excerpt, summary, faq, featured_image,
                               status, category_id, reading_time, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    CASE WHEN $9 = 'published' THEN now() END)
            "#,
        )
        .bind(id)
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.summary)
        .bind(input.faq.map(Json))
        .bind(input.featured_image.as_deref())
        .bind(input.status.as_str())
        .bind(input.category_id)
        .bind(input.reading_time)
        .execute(&mut *tx)
        .await?;

        replace_tags(&mut tx, id, &input.tag_ids).await?;
        tx.commit().await?;

        self.get_post(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post {id}")))
    }

    pub async fn update_post(&self, id: Uuid, update: &PostUpdate) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        // Nullable columns take a "set" flag so an explicit null can clear them.
        let updated = sqlx::query(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                content = COALESCE($4, content),
                excerpt = COALESCE($5, excerpt),
                summary = COALESCE($6, summary),
                faq = CASE WHEN $7 THEN $8 ELSE faq END,
                featured_image = CASE WHEN $9 THEN $10 ELSE featured_image END,
                category_id = CASE WHEN $11 THEN $12 ELSE category_id END,
                reading_time = CASE WHEN $13 THEN $14 ELSE reading_time END,
                status = COALESCE($15, status),
                published_at = CASE
                    WHEN $15 = 'published' AND published_at IS NULL THEN now()
                    ELSE published_at
                END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.slug.as_deref())
        .bind(update.content.as_deref())
        .bind(update.excerpt.as_deref())
        .bind(update.summary.as_deref())
        .bind(update.faq.is_some())
        .bind(update.faq.clone().flatten().map(Json))
        .bind(update.featured_image.is_some())
        .bind(update.featured_image.clone().flatten())
        .bind(update.category_id.is_some())
        .bind(update.category_id.flatten())
        .bind(update.reading_time.is_some())
        .bind(update.reading_time.flatten())
        .bind(update.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("post {id}")));
        }
        if let Some(tag_ids) = &update.tag_ids {
            replace_tags(&mut tx, id, tag_ids).await?;
        }
        tx.commit().await?;

        self.get_post(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post {id}")))
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn attach_tags(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<TagRef>> = HashMap::new();
        for row in tag_rows {
            by_post.entry(row.post_id).or_default().push(TagRef {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }
        rows.into_iter()
            .map(|row| {
                let tags = by_post.remove(&row.id).unwrap_or_default();
                row.into_post(tags)
            })
            .collect()
    }

    // ============================================
    // Categories & tags
    // ============================================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY c.name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (id, name, slug, description, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, icon, created_at, 0::bigint AS post_count
            "#,
        )
        .bind(uuidv7())
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.icon.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn update_category(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category> {
        let updated = sqlx::query(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                icon = CASE WHEN $5 THEN $6 ELSE icon END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.slug.as_deref())
        .bind(update.description.as_deref())
        .bind(update.icon.is_some())
        .bind(update.icon.clone().flatten())
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("category {id}")));
        }

        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, i64)>(
            r#"
            SELECT t.id, t.name, t.slug,
                   (SELECT COUNT(*) FROM post_tags pt WHERE pt.tag_id = t.id) AS post_count
            FROM tags t
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, slug, post_count)| Tag {
                id,
                name,
                slug,
                post_count,
            })
            .collect())
    }

    pub async fn create_tag(&self, input: NewTag) -> Result<Tag> {
        let (id, name, slug) = sqlx::query_as::<_, (Uuid, String, String)>(
            "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug",
        )
        .bind(uuidv7())
        .bind(&input.name)
        .bind(&input.slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(Tag {
            id,
            name,
            slug,
            post_count: 0,
        })
    }

    // ============================================
    // Site settings
    // ============================================

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value =
            sqlx::query_scalar::<_, String>("SELECT value FROM site_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    pub async fn list_settings(&self) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM site_settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM site_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_credential<'e, E>(executor: E, input: NewCredential) -> Result<Credential>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CredentialRow>(&format!(
        r#"
        INSERT INTO admins (id, email, name, password_hash, role, is_active, google_id, avatar)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {CREDENTIAL_COLUMNS}
        "#
    ))
    .bind(uuidv7())
    .bind(&input.email)
    .bind(&input.name)
    .bind(input.password_hash.as_deref())
    .bind(input.role.as_str())
    .bind(input.is_active)
    .bind(input.google_id.as_deref())
    .bind(input.avatar.as_deref())
    .fetch_one(executor)
    .await?;
    Credential::try_from(row)
}

/// Both tables were empty when setup began, so any unique violation means
/// another setup committed first.
fn lost_setup_race(e: StoreError) -> StoreError {
    match e {
        StoreError::Conflict(_) => StoreError::SetupComplete,
        other => other,
    }
}

/// Replace the full tag set of a post inside an open transaction.
async fn replace_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO post_tags (post_id, tag_id) \
         SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(post_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn setup_conflicts_mean_setup_already_ran() {
        assert!(matches!(
            lost_setup_race(StoreError::Conflict("admins_email_key".into())),
            StoreError::SetupComplete
        ));
        assert!(matches!(
            lost_setup_race(StoreError::Conflict("setup_marker_pkey".into())),
            StoreError::SetupComplete
        ));
        assert!(matches!(
            lost_setup_race(StoreError::Unavailable("down".into())),
            StoreError::Unavailable(_)
        ));
    }
}
