//! Blog content domain models.
//!
//! Read models serialize in camelCase and are returned by the HTTP layer
//! as-is; write models are plain structs filled from request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// One question/answer pair attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

/// Category summary embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Tag summary embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// A blog post with its category and tags resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub summary: String,
    pub faq: Option<Vec<FaqItem>>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub category: Option<CategoryRef>,
    pub tags: Vec<TagRef>,
    pub reading_time: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Input for inserting a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub summary: String,
    pub faq: Option<Vec<FaqItem>>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub category_id: Option<Uuid>,
    pub reading_time: Option<i32>,
    pub tag_ids: Vec<Uuid>,
}

/// Explicit set of mutable post fields.
///
/// Outer `None` leaves a field untouched; for nullable columns the inner
/// `None` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub summary: Option<String>,
    pub faq: Option<Option<Vec<FaqItem>>>,
    pub featured_image: Option<Option<String>>,
    pub status: Option<PostStatus>,
    pub category_id: Option<Option<Uuid>>,
    pub reading_time: Option<Option<i32>>,
    /// Replaces the whole tag set when present.
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Filters and paging for post listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// 1-based page number.
    pub page: i64,
    pub per_page: i64,
    pub status: Option<PostStatus>,
    pub category_slug: Option<String>,
    pub tag_slug: Option<String>,
    /// Case-insensitive match on title, content, or excerpt.
    pub search: Option<String>,
}

impl PostQuery {
    pub const MAX_PER_PAGE: i64 = 100;
    /// Highest page whose offset still fits in an `i64`.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_PER_PAGE;

    /// Published posts only, first page.
    pub fn published(per_page: i64) -> Self {
        Self {
            page: 1,
            per_page,
            status: Some(PostStatus::Published),
            category_slug: None,
            tag_slug: None,
            search: None,
        }
    }

    /// Clamp paging into sane bounds.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.clamp(1, Self::MAX_PAGE);
        self.per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(0))
    }
}

/// One page of posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

impl PostPage {
    pub fn new(posts: Vec<Post>, total: i64, query: &PostQuery) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + query.per_page - 1) / query.per_page
        };
        Self {
            posts,
            total,
            total_pages,
            page: query.page,
        }
    }

    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            total: 0,
            total_pages: 0,
            page: 1,
        }
    }
}

/// Category with its post count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: Option<String>,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<Option<String>>,
}

/// Tag with its post count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_normalization_clamps_paging() {
        let q = PostQuery {
            page: 0,
            per_page: 5_000,
            ..PostQuery::published(10)
        }
        .normalized();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, PostQuery::MAX_PER_PAGE);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn huge_pages_do_not_overflow_the_offset() {
        let q = PostQuery {
            page: i64::MAX,
            per_page: PostQuery::MAX_PER_PAGE,
            ..PostQuery::published(10)
        };
        assert_eq!(q.offset(), i64::MAX);

        let q = q.normalized();
        assert_eq!(q.page, PostQuery::MAX_PAGE);
        assert!(q.offset() >= 0);
        assert!(q.offset() <= i64::MAX - PostQuery::MAX_PER_PAGE);
    }

    #[test]
    fn page_count_rounds_up() {
        let q = PostQuery {
            page: 2,
            ..PostQuery::published(10)
        };
        let page = PostPage::new(Vec::new(), 21, &q);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(PostPage::new(Vec::new(), 0, &q).total_pages, 0);
    }

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!(PostStatus::parse("published"), Some(PostStatus::Published));
        assert_eq!(PostStatus::parse("archived"), None);
    }
}
