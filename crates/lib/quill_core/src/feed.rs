//! RSS 2.0 feed and XML sitemap rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::content::{Category, Post, PostQuery};
use crate::store::{Store, StoreError};

/// Number of posts in the RSS feed.
pub const FEED_SIZE: i64 = 20;

/// Site settings keys read for the feed channel.
pub const SITE_TITLE_KEY: &str = "site_title";
pub const SITE_DESCRIPTION_KEY: &str = "site_description";

const DEFAULT_TITLE: &str = "Quill";
const DEFAULT_DESCRIPTION: &str = "Latest articles";

/// Pages listed in every sitemap: (path, change frequency, priority).
const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("", "daily", "1.0"),
    ("/about", "monthly", "0.5"),
    ("/contact", "monthly", "0.5"),
    ("/privacy", "monthly", "0.3"),
    ("/feed.xml", "daily", "0.3"),
];

/// Channel-level metadata.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    /// Base URL without trailing slash.
    pub url: String,
    pub title: String,
    pub description: String,
}

impl SiteInfo {
    /// Load title and description from site settings, falling back to defaults.
    pub async fn load(store: &Store, url: &str) -> Result<Self, StoreError> {
        let title = store.get_setting(SITE_TITLE_KEY).await?;
        let description = store.get_setting(SITE_DESCRIPTION_KEY).await?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        })
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn rfc822(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn post_url(site: &SiteInfo, post: &Post) -> String {
    format!("{}/post/{}", site.url, post.slug)
}

/// Render an RSS 2.0 document for the given posts.
pub fn render_rss(site: &SiteInfo, posts: &[Post], now: DateTime<Utc>) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str("  <channel>\n");
    let _ = writeln!(xml, "    <title>{}</title>", escape_xml(&site.title));
    let _ = writeln!(xml, "    <link>{}</link>", escape_xml(&site.url));
    let _ = writeln!(
        xml,
        "    <description>{}</description>",
        escape_xml(&site.description)
    );
    let _ = writeln!(xml, "    <lastBuildDate>{}</lastBuildDate>", rfc822(now));
    let _ = writeln!(
        xml,
        "    <atom:link href=\"{}/feed.xml\" rel=\"self\" type=\"application/rss+xml\" />",
        escape_xml(&site.url)
    );

    for post in posts {
        let link = escape_xml(&post_url(site, post));
        let description = if post.excerpt.is_empty() {
            &post.summary
        } else {
            &post.excerpt
        };
        xml.push_str("    <item>\n");
        let _ = writeln!(xml, "      <title>{}</title>", escape_xml(&post.title));
        let _ = writeln!(xml, "      <link>{link}</link>");
        let _ = writeln!(xml, "      <guid isPermaLink=\"true\">{link}</guid>");
        let _ = writeln!(
            xml,
            "      <description>{}</description>",
            escape_xml(description)
        );
        let _ = writeln!(
            xml,
            "      <pubDate>{}</pubDate>",
            rfc822(post.published_at.unwrap_or(post.created_at))
        );
        if let Some(category) = &post.category {
            let _ = writeln!(xml, "      <category>{}</category>", escape_xml(&category.name));
        }
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n</rss>\n");
    xml
}

/// Render a sitemap of static pages, categories and posts.
pub fn render_sitemap(
    site: &SiteInfo,
    categories: &[Category],
    posts: &[Post],
    now: DateTime<Utc>,
) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    let mut push = |loc: &str, lastmod: DateTime<Utc>, freq: &str, priority: &str| {
        let _ = writeln!(
            xml,
            "  <url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{freq}</changefreq><priority>{priority}</priority></url>",
            escape_xml(loc),
            lastmod.format("%Y-%m-%d"),
        );
    };

    for &(path, freq, priority) in STATIC_PAGES {
        push(&format!("{}{path}", site.url), now, freq, priority);
    }
    for category in categories {
        push(
            &format!("{}/category/{}", site.url, category.slug),
            now,
            "weekly",
            "0.8",
        );
    }
    for post in posts {
        push(&post_url(site, post), post.updated_at, "weekly", "0.7");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Build the RSS feed from the latest published posts.
pub async fn build_rss(store: &Store, site_url: &str) -> Result<String, StoreError> {
    let site = SiteInfo::load(store, site_url).await?;
    let page = store.list_posts(&PostQuery::published(FEED_SIZE)).await?;
    Ok(render_rss(&site, &page.posts, Utc::now()))
}

/// Build the sitemap, paging through every published post.
pub async fn build_sitemap(store: &Store, site_url: &str) -> Result<String, StoreError> {
    let site = SiteInfo::load(store, site_url).await?;
    let categories = store.list_categories().await?;

    let mut posts = Vec::new();
    let mut query = PostQuery::published(PostQuery::MAX_PER_PAGE);
    loop {
        let page = store.list_posts(&query).await?;
        posts.extend(page.posts);
        if query.page >= page.total_pages {
            break;
        }
        query.page += 1;
    }
    Ok(render_sitemap(&site, &categories, &posts, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::{CategoryRef, PostStatus};
    use chrono::TimeZone;

    fn site() -> SiteInfo {
        SiteInfo {
            url: "https://blog.example".into(),
            title: "Tom & Jerry's".into(),
            description: "d".into(),
        }
    }

    fn post(slug: &str) -> Post {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        Post {
            id: crate::uuid::uuidv7(),
            slug: slug.into(),
            title: "<b>Bold</b>".into(),
            content: String::new(),
            excerpt: String::new(),
            summary: "sum".into(),
            faq: None,
            featured_image: None,
            status: PostStatus::Published,
            category: Some(CategoryRef {
                id: crate::uuid::uuidv7(),
                name: "News".into(),
                slug: "news".into(),
            }),
            tags: Vec::new(),
            reading_time: None,
            published_at: Some(at),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;");
    }

    #[test]
    fn rss_contains_escaped_items() {
        let xml = render_rss(&site(), &[post("hello")], Utc::now());
        assert!(xml.contains("<title>Tom &amp; Jerry&apos;s</title>"));
        assert!(xml.contains("<title>&lt;b&gt;Bold&lt;/b&gt;</title>"));
        assert!(xml.contains("<link>https://blog.example/post/hello</link>"));
        assert!(xml.contains("<description>sum</description>"));
        assert!(xml.contains("<pubDate>Wed, 04 Mar 2026 05:06:07 GMT</pubDate>"));
        assert!(xml.contains("<category>News</category>"));
    }

    #[test]
    fn sitemap_lists_static_pages_and_posts() {
        let xml = render_sitemap(&site(), &[], &[post("a"), post("b")], Utc::now());
        assert!(xml.contains("<loc>https://blog.example</loc>"));
        assert!(xml.contains("<loc>https://blog.example/about</loc>"));
        assert!(xml.contains("<loc>https://blog.example/post/b</loc><lastmod>2026-03-04</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), STATIC_PAGES.len() + 2);
    }

    #[tokio::test]
    async fn site_info_reads_settings() {
        let store = Store::in_memory();
        store.put_setting(SITE_TITLE_KEY, "My Blog").await.unwrap();
        let site = SiteInfo::load(&store, "https://x.example/").await.unwrap();
        assert_eq!(site.url, "https://x.example");
        assert_eq!(site.title, "My Blog");
        assert_eq!(site.description, DEFAULT_DESCRIPTION);
    }
}
