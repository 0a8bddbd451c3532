//! Data models for the article feed.
//!
//! The pipeline that produces `all_articles.json` is not strict about its
//! output, so the feed is read in two steps:
//! - [`RawArticle`]: the wire shape, where every field may be missing or null
//! - [`Article`]: the normalized article the rest of the crate works with
//!
//! [`Feed::parse`] performs both steps and skips (with a warning) any entry
//! that cannot be used instead of rejecting the whole document.

use crate::error::FeedError;
use crate::utils::{join_site_root, parse_published};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Shown when an article arrives without a title.
pub const UNTITLED: &str = "Untitled";
/// Shown when an article arrives without a topic.
pub const DEFAULT_TOPIC: &str = "News";

/// A feed entry exactly as it appears on the wire.
///
/// All fields are optional because the producing pipeline may omit or null
/// any of them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawArticle {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Path relative to the site root, e.g. `articles/some-slug.html`.
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub published_iso: Option<String>,
    pub topic: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_breaking: Option<bool>,
    pub trend_score: Option<f64>,
    pub summary_short: Option<String>,
    pub audio_url: Option<String>,
}

/// Why a feed entry was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    MissingLink,
}

impl RawArticle {
    /// Normalize into an [`Article`].
    ///
    /// Entries without an `id` or `link` cannot be linked to and are
    /// rejected. Blank strings count as missing.
    pub fn normalize(self) -> Result<Article, SkipReason> {
        let id = non_empty(self.id).ok_or(SkipReason::MissingId)?;
        let link = non_empty(self.link).ok_or(SkipReason::MissingLink)?;
        let published_iso = non_empty(self.published_iso);
        let published = published_iso.as_deref().and_then(parse_published);
        if published_iso.is_some() && published.is_none() {
            debug!(%id, iso = ?published_iso, "Unparseable publication timestamp");
        }

        let tags = self
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Article {
            id,
            title: non_empty(self.title),
            link,
            image_url: non_empty(self.image_url),
            published_iso,
            published,
            topic: non_empty(self.topic),
            tags,
            is_breaking: self.is_breaking.unwrap_or(false),
            trend_score: self.trend_score.filter(|s| s.is_finite()).unwrap_or(0.0),
            summary_short: non_empty(self.summary_short),
            audio_url: non_empty(self.audio_url),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A normalized article. Immutable for the lifetime of a page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub published_iso: Option<String>,
    #[serde(skip)]
    pub published: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub tags: Vec<String>,
    pub is_breaking: bool,
    pub trend_score: f64,
    pub summary_short: Option<String>,
    pub audio_url: Option<String>,
}

impl Article {
    /// Title for display, `"Untitled"` when missing.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }

    /// Topic for display, `"News"` when missing.
    pub fn display_topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    pub fn summary(&self) -> &str {
        self.summary_short.as_deref().unwrap_or("")
    }

    /// The article image, or `placeholder` when it has none.
    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.image_url.as_deref().unwrap_or(placeholder)
    }

    /// Link to the article page resolved against the site root.
    pub fn href(&self, site_root: &str) -> String {
        join_site_root(site_root, &self.link)
    }

    /// Time since publication, if the publication time is known.
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.published.map(|p| now - p)
    }
}

/// Top-level shape of `all_articles.json`.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    articles: Option<Vec<serde_json::Value>>,
}

/// The parsed article feed, in feed order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Feed {
    pub articles: Vec<Article>,
}

impl Feed {
    /// Parse the JSON text of an article feed.
    ///
    /// # Errors
    ///
    /// [`FeedError::Malformed`] when the text is not a JSON object and
    /// [`FeedError::MissingArticles`] when it has no `articles` array.
    /// Individual bad entries are skipped, not reported as errors.
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        let doc: FeedDocument = serde_json::from_str(text)?;
        let entries = doc.articles.ok_or(FeedError::MissingArticles)?;
        let total = entries.len();

        let mut articles = Vec::with_capacity(total);
        for (index, entry) in entries.into_iter().enumerate() {
            let raw = match serde_json::from_value::<RawArticle>(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(index, error = %e, "Skipping unreadable feed entry");
                    continue;
                }
            };
            match raw.normalize() {
                Ok(article) => articles.push(article),
                Err(reason) => warn!(index, ?reason, "Skipping feed entry"),
            }
        }

        debug!(total, kept = articles.len(), "Parsed article feed");
        Ok(Self { articles })
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A complete article published at `published_iso`.
    pub fn article(id: &str, title: &str, published_iso: &str) -> Article {
        RawArticle {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            link: Some(format!("articles/{id}.html")),
            published_iso: Some(published_iso.to_string()),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parse_full_entry() {
        let json = r#"{
            "articles": [{
                "id": "a1b2",
                "title": "New AI Chip Unveiled",
                "link": "articles/new-ai-chip.html",
                "image_url": "https://img.example.com/chip.jpg",
                "published_iso": "2025-05-06T14:30:00Z",
                "topic": "Hardware",
                "tags": ["gpu", " nvidia ", ""],
                "is_breaking": true,
                "trend_score": 12.5,
                "summary_short": "A new accelerator.",
                "audio_url": null
            }]
        }"#;

        let feed = Feed::parse(json).unwrap();
        assert_eq!(feed.articles.len(), 1);
        let a = &feed.articles[0];
        assert_eq!(a.id, "a1b2");
        assert_eq!(a.display_title(), "New AI Chip Unveiled");
        assert_eq!(a.tags, vec!["gpu".to_string(), "nvidia".to_string()]);
        assert!(a.is_breaking);
        assert_eq!(a.trend_score, 12.5);
        assert!(a.published.is_some());
        assert_eq!(a.audio_url, None);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let json = r#"{"articles": [{"id": "x", "link": "articles/x.html", "title": null, "tags": null}]}"#;
        let feed = Feed::parse(json).unwrap();
        let a = &feed.articles[0];
        assert_eq!(a.display_title(), UNTITLED);
        assert_eq!(a.display_topic(), DEFAULT_TOPIC);
        assert_eq!(a.image_or("placeholder.png"), "placeholder.png");
        assert_eq!(a.summary(), "");
        assert!(a.tags.is_empty());
        assert!(!a.is_breaking);
        assert_eq!(a.trend_score, 0.0);
    }

    #[test]
    fn test_entries_without_id_or_link_are_skipped() {
        let json = r#"{"articles": [
            {"title": "No id", "link": "articles/a.html"},
            {"id": "b", "title": "No link"},
            {"id": "c", "title": "Blank link", "link": "   "},
            {"id": "d", "title": "Kept", "link": "articles/d.html"}
        ]}"#;
        let feed = Feed::parse(json).unwrap();
        assert_eq!(feed.articles.len(), 1);
        assert_eq!(feed.articles[0].id, "d");
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let json = r#"{"articles": [
            {"id": "a", "link": "articles/a.html", "tags": 42},
            "not an object",
            {"id": "b", "link": "articles/b.html"}
        ]}"#;
        let feed = Feed::parse(json).unwrap();
        assert_eq!(feed.articles.len(), 1);
        assert_eq!(feed.articles[0].id, "b");
    }

    #[test]
    fn test_missing_articles_field() {
        let err = Feed::parse(r#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, FeedError::MissingArticles));
        let err = Feed::parse(r#"{"articles": null}"#).unwrap_err();
        assert!(matches!(err, FeedError::MissingArticles));
    }

    #[test]
    fn test_malformed_json() {
        let err = Feed::parse(r#"{"articles": [ "#).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn test_unparseable_date_is_not_fatal() {
        let json = r#"{"articles": [{"id": "a", "link": "articles/a.html", "published_iso": "last tuesday"}]}"#;
        let feed = Feed::parse(json).unwrap();
        assert_eq!(feed.articles[0].published, None);
        assert_eq!(feed.articles[0].published_iso.as_deref(), Some("last tuesday"));
    }

    #[test]
    fn test_href_rooted_at_site_root() {
        let a = fixtures::article("a", "A", "2025-05-06T00:00:00Z");
        assert_eq!(a.href("/"), "/articles/a.html");
        assert_eq!(
            a.href("https://news.example.com/"),
            "https://news.example.com/articles/a.html"
        );
    }

    #[test]
    fn test_find_by_id() {
        let feed = Feed {
            articles: vec![
                fixtures::article("a", "A", "2025-05-06T00:00:00Z"),
                fixtures::article("b", "B", "2025-05-06T00:00:00Z"),
            ],
        };
        assert_eq!(feed.find("b").map(|a| a.display_title()), Some("B"));
        assert!(feed.find("zzz").is_none());
    }
}
