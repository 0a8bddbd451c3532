//! Relevance scoring for free-text search and the related-articles sidebar.
//!
//! Both rankers are pure functions of the feed plus their query context, and
//! both sort with a stable sort so equal scores keep feed order.

use crate::config::RelatedConfig;
use crate::models::Article;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Per-token points by field.
pub const TOKEN_IN_TITLE: u32 = 15;
pub const TOKEN_IN_TOPIC: u32 = 8;
pub const TOKEN_IN_TAG: u32 = 5;
pub const TOKEN_IN_SUMMARY: u32 = 2;

/// Whole-phrase points; only the first matching field in this order counts.
pub const PHRASE_IN_TITLE: u32 = 50;
pub const PHRASE_IN_TOPIC: u32 = 25;
pub const PHRASE_IN_TAGS: u32 = 15;
pub const PHRASE_IN_SUMMARY: u32 = 10;

/// Awarded when every token appears somewhere in the article.
pub const ALL_TOKENS_BONUS: u32 = 20;

pub const SAME_TOPIC_POINTS: f64 = 500.0;
pub const SHARED_TAG_POINTS: f64 = 50.0;
pub const RECENCY_MAX_POINTS: f64 = 10.0;
pub const RECENCY_HORIZON_DAYS: f64 = 30.0;

/// An article paired with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct Scored<'a, S> {
    pub score: S,
    pub article: &'a Article,
}

/// Lowercase a query and split it on non-word characters, dropping empties.
pub fn tokenize(query: &str) -> Vec<String> {
    NON_WORD
        .split(&query.to_lowercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercased searchable fields of one article.
struct SearchFields {
    title: String,
    topic: String,
    tags: Vec<String>,
    summary: String,
}

impl SearchFields {
    fn of(article: &Article) -> Self {
        Self {
            title: article.title.as_deref().unwrap_or("").to_lowercase(),
            topic: article.topic.as_deref().unwrap_or("").to_lowercase(),
            tags: article.tags.iter().map(|t| t.to_lowercase()).collect(),
            summary: article.summary().to_lowercase(),
        }
    }

    fn any_tag_contains(&self, needle: &str) -> bool {
        self.tags.iter().any(|t| t.contains(needle))
    }
}

/// Score one article against an already-tokenized query.
///
/// # Examples
///
/// ```ignore
/// // "ai chip" vs. title "New AI Chip Unveiled":
/// // 15 + 15 (tokens in title) + 50 (phrase in title) + 20 (all tokens) = 100
/// ```
pub fn search_score(article: &Article, tokens: &[String]) -> u32 {
    if tokens.is_empty() {
        return 0;
    }
    let fields = SearchFields::of(article);
    let mut score = 0;

    for token in tokens {
        if fields.title.contains(token.as_str()) {
            score += TOKEN_IN_TITLE;
        }
        if fields.topic.contains(token.as_str()) {
            score += TOKEN_IN_TOPIC;
        }
        if fields.any_tag_contains(token) {
            score += TOKEN_IN_TAG;
        }
        if fields.summary.contains(token.as_str()) {
            score += TOKEN_IN_SUMMARY;
        }
    }

    let phrase = tokens.join(" ");
    if fields.title.contains(&phrase) {
        score += PHRASE_IN_TITLE;
    } else if fields.topic.contains(&phrase) {
        score += PHRASE_IN_TOPIC;
    } else if fields.any_tag_contains(&phrase) {
        score += PHRASE_IN_TAGS;
    } else if fields.summary.contains(&phrase) {
        score += PHRASE_IN_SUMMARY;
    }

    let haystack = format!(
        "{} {} {} {}",
        fields.title,
        fields.topic,
        fields.tags.join(" "),
        fields.summary
    );
    if tokens.iter().all(|t| haystack.contains(t.as_str())) {
        score += ALL_TOKENS_BONUS;
    }

    score
}

/// Rank the feed for a free-text query. Zero-score articles are excluded.
pub fn search<'a>(articles: &'a [Article], query: &str) -> Vec<Scored<'a, u32>> {
    let tokens = tokenize(query);
    articles
        .iter()
        .map(|article| Scored {
            score: search_score(article, &tokens),
            article,
        })
        .filter(|s| s.score > 0)
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .collect()
}

/// What the reader is looking at when related articles are computed.
#[derive(Debug, Clone)]
pub struct RelatedContext {
    pub id: String,
    pub topic: Option<String>,
    tags: HashSet<String>,
}

impl RelatedContext {
    pub fn new(id: &str, topic: Option<&str>, tags: &[String]) -> Self {
        Self {
            id: id.to_string(),
            topic: topic.map(str::to_string),
            tags: tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn of(article: &Article) -> Self {
        Self::new(&article.id, article.topic.as_deref(), &article.tags)
    }
}

/// Recency points: full marks when just published, nothing after 30 days.
pub fn recency_points(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(published) = published else {
        return 0.0;
    };
    let age_days = (now - published).num_seconds() as f64 / 86_400.0;
    (1.0 - age_days / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0) * RECENCY_MAX_POINTS
}

/// Score a candidate against the current article.
pub fn related_score(context: &RelatedContext, candidate: &Article, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;
    if let (Some(current), Some(topic)) = (&context.topic, &candidate.topic) {
        if current == topic {
            score += SAME_TOPIC_POINTS;
        }
    }
    let shared = candidate
        .tags
        .iter()
        .map(|t| t.to_lowercase())
        .unique()
        .filter(|t| context.tags.contains(t))
        .count();
    score += SHARED_TAG_POINTS * shared as f64;
    score + recency_points(candidate.published, now)
}

/// Rank candidates for the related-articles sidebar, best first, at most `count`.
pub fn related<'a>(
    articles: &'a [Article],
    context: &RelatedContext,
    now: DateTime<Utc>,
    min_score: f64,
    count: usize,
) -> Vec<Scored<'a, f64>> {
    articles
        .iter()
        .filter(|a| a.id != context.id)
        .map(|article| Scored {
            score: related_score(context, article, now),
            article,
        })
        .filter(|s| s.score >= min_score)
        .sorted_by(|a, b| b.score.total_cmp(&a.score))
        .take(count)
        .collect()
}

/// How many related items the sidebar should show.
///
/// Without a measured article body the default count is used; with one, the
/// sidebar is sized to roughly match the body, clamped to
/// `[default_items, max_items]`.
pub fn sidebar_item_count(body_height_px: Option<f64>, config: &RelatedConfig) -> usize {
    let lower = config.default_items;
    let upper = config.max_items.max(lower);
    match body_height_px {
        Some(h) if h.is_finite() && h > 0.0 && config.item_height_px > 0.0 => {
            let fitted = (h / config.item_height_px).round() as usize;
            fitted.clamp(lower, upper)
        }
        _ => lower,
    }
}

/// Articles listed on a topic page: topic or any tag equal to `name`, ignoring case.
pub fn by_topic<'a>(articles: &'a [Article], name: &str) -> Vec<&'a Article> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Vec::new();
    }
    articles
        .iter()
        .filter(|a| {
            a.topic.as_deref().is_some_and(|t| t.to_lowercase() == name)
                || a.tags.iter().any(|t| t.to_lowercase() == name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticle;
    use crate::utils::parse_published;
    use chrono::Duration;

    fn article(id: &str, title: &str, topic: &str, tags: &[&str], summary: &str) -> Article {
        RawArticle {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            link: Some(format!("articles/{id}.html")),
            topic: Some(topic.to_string()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            summary_short: Some(summary.to_string()),
            ..Default::default()
        }
        .normalize()
        .unwrap()
    }

    fn published(mut a: Article, at: DateTime<Utc>) -> Article {
        a.published = Some(at);
        a
    }

    fn now() -> DateTime<Utc> {
        parse_published("2025-05-06T12:00:00Z").unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("AI chip"), vec!["ai", "chip"]);
        assert_eq!(tokenize("  GPU-prices, 2025! "), vec!["gpu", "prices", "2025"]);
        assert!(tokenize("  ?! ").is_empty());
    }

    #[test]
    fn test_search_score_title_example() {
        let a = article("1", "New AI Chip Unveiled", "", &[], "");
        assert_eq!(search_score(&a, &tokenize("ai chip")), 100);
    }

    #[test]
    fn test_phrase_bonus_uses_first_matching_field_only() {
        // phrase in topic and summary, not title: only the topic bonus applies
        let a = article("1", "Quarterly results", "ai chip", &[], "about the ai chip");
        let tokens = tokenize("ai chip");
        let expected = 2 * TOKEN_IN_TOPIC + 2 * TOKEN_IN_SUMMARY + PHRASE_IN_TOPIC + ALL_TOKENS_BONUS;
        assert_eq!(search_score(&a, &tokens), expected);
    }

    #[test]
    fn test_all_tokens_bonus_across_fields() {
        let a = article("1", "AI everywhere", "Hardware", &["chip"], "");
        let tokens = tokenize("ai chip");
        // "ai" in title, "chip" in a tag, no phrase match
        assert_eq!(
            search_score(&a, &tokens),
            TOKEN_IN_TITLE + TOKEN_IN_TAG + ALL_TOKENS_BONUS
        );
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let a = article("1", "Anything", "News", &[], "");
        assert_eq!(search_score(&a, &[]), 0);
        assert!(search(&[a], "   ").is_empty());
    }

    #[test]
    fn test_search_excludes_zero_and_keeps_feed_order_on_ties() {
        let articles = vec![
            article("first", "Chip news", "", &[], ""),
            article("none", "Weather", "", &[], ""),
            article("second", "Chip news", "", &[], ""),
            article("best", "New AI Chip", "", &[], ""),
        ];
        let ids: Vec<&str> = search(&articles, "chip")
            .iter()
            .map(|s| s.article.id.as_str())
            .collect();
        // all three score 85, so feed order decides
        assert_eq!(ids, vec!["first", "second", "best"]);
    }

    #[test]
    fn test_search_orders_by_score() {
        let articles = vec![
            article("summary-only", "Markets", "", &[], "a chip shortage"),
            article("title", "Chip shortage", "", &[], ""),
        ];
        let results = search(&articles, "chip");
        assert_eq!(results[0].article.id, "title");
        assert_eq!(results[1].article.id, "summary-only");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_recency_points() {
        let now = now();
        assert_eq!(recency_points(Some(now), now), 10.0);
        assert!((recency_points(Some(now - Duration::days(15)), now) - 5.0).abs() < 1e-9);
        assert_eq!(recency_points(Some(now - Duration::days(45)), now), 0.0);
        assert_eq!(recency_points(Some(now + Duration::days(2)), now), 10.0);
        assert_eq!(recency_points(None, now), 0.0);
    }

    #[test]
    fn test_related_score_example() {
        let now = now();
        let current = article("cur", "Current", "Hardware", &["gpu", "nvidia"], "");
        let context = RelatedContext::of(&current);
        let candidate = published(article("c", "C", "Hardware", &["gpu"], ""), now);
        let score = related_score(&context, &candidate, now);
        assert!((score - 560.0).abs() < 1e-9);
    }

    #[test]
    fn test_related_ranking_and_exclusions() {
        let now = now();
        let current = article("cur", "Current", "Hardware", &["gpu", "nvidia"], "");
        let articles = vec![
            current.clone(),
            // same topic, no shared tags, no date: 500
            article("plain", "Plain", "Hardware", &[], ""),
            // same topic, one shared tag, fresh: 560
            published(article("fresh", "Fresh", "Hardware", &["GPU"], ""), now),
            // other topic, nothing shared, 40 days old: 0 -> dropped
            published(
                article("stale", "Stale", "Politics", &[], ""),
                now - Duration::days(40),
            ),
            // other topic, nothing shared, 3 days old: 9 -> below cutoff
            published(
                article("weak", "Weak", "Politics", &[], ""),
                now - Duration::days(3),
            ),
            // other topic, two shared tags: 100
            article("tags", "Tags", "Markets", &["nvidia", "gpu"], ""),
        ];
        let context = RelatedContext::of(&current);
        let ids: Vec<&str> = related(&articles, &context, now, 10.0, 5)
            .iter()
            .map(|s| s.article.id.as_str())
            .collect();
        assert_eq!(ids, vec!["fresh", "plain", "tags"]);
    }

    #[test]
    fn test_related_ties_keep_feed_order_and_respect_count() {
        let now = now();
        let context = RelatedContext::new("cur", Some("Science"), &[]);
        let articles: Vec<Article> = (0..8)
            .map(|i| article(&format!("s{i}"), "S", "Science", &[], ""))
            .collect();
        let ids: Vec<String> = related(&articles, &context, now, 10.0, 5)
            .iter()
            .map(|s| s.article.id.clone())
            .collect();
        assert_eq!(ids, vec!["s0", "s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_sidebar_item_count() {
        let config = RelatedConfig::default();
        assert_eq!(sidebar_item_count(None, &config), 5);
        assert_eq!(sidebar_item_count(Some(200.0), &config), 5);
        assert_eq!(sidebar_item_count(Some(630.0), &config), 7);
        assert_eq!(sidebar_item_count(Some(5_000.0), &config), 10);
        assert_eq!(sidebar_item_count(Some(f64::NAN), &config), 5);
    }

    #[test]
    fn test_by_topic_matches_topic_or_tag() {
        let articles = vec![
            article("a", "A", "Hardware", &[], ""),
            article("b", "B", "Politics", &["hardware"], ""),
            article("c", "C", "Politics", &["elections"], ""),
        ];
        let ids: Vec<&str> = by_topic(&articles, "HARDWARE")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(by_topic(&articles, " ").is_empty());
    }
}
