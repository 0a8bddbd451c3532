//! Choosing which articles the banner features.

use crate::config::SliderConfig;
use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Badge shown on the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlideLabel {
    Breaking,
    Trending,
}

impl fmt::Display for SlideLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideLabel::Breaking => f.write_str("Breaking"),
            SlideLabel::Trending => f.write_str("Trending"),
        }
    }
}

/// The curated, non-empty list of articles for the banner.
#[derive(Debug, Clone, Serialize)]
pub struct SlideSet {
    pub label: SlideLabel,
    pub articles: Vec<Article>,
}

impl SlideSet {
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Whether an article is breaking news fresh enough to lead the banner.
///
/// An article without a known publication time never qualifies.
pub fn is_fresh_breaking(article: &Article, now: DateTime<Utc>, window: Duration) -> bool {
    article.is_breaking && article.age(now).is_some_and(|age| age <= window)
}

/// Pick the banner's slides.
///
/// Fresh breaking articles win, in feed order. Otherwise the highest trend
/// scores are featured, ties keeping feed order. Returns `None` when the
/// feed has nothing to show, in which case the banner section is hidden.
pub fn select_slides(
    articles: &[Article],
    now: DateTime<Utc>,
    config: &SliderConfig,
) -> Option<SlideSet> {
    let window = Duration::hours(config.breaking_window_hours);
    let breaking: Vec<Article> = articles
        .iter()
        .filter(|a| is_fresh_breaking(a, now, window))
        .take(config.max_slides)
        .cloned()
        .collect();

    let set = if !breaking.is_empty() {
        SlideSet {
            label: SlideLabel::Breaking,
            articles: breaking,
        }
    } else {
        SlideSet {
            label: SlideLabel::Trending,
            articles: articles
                .iter()
                .sorted_by(|a, b| b.trend_score.total_cmp(&a.trend_score))
                .take(config.max_slides)
                .cloned()
                .collect(),
        }
    };

    debug!(label = %set.label, count = set.len(), "Selected banner slides");
    (!set.is_empty()).then_some(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::article;
    use crate::utils::parse_published;

    fn now() -> DateTime<Utc> {
        parse_published("2025-05-06T12:00:00Z").unwrap()
    }

    fn breaking(id: &str, iso: &str) -> Article {
        let mut a = article(id, id, iso);
        a.is_breaking = true;
        a
    }

    fn trending(id: &str, score: f64) -> Article {
        let mut a = article(id, id, "2025-05-01T00:00:00Z");
        a.trend_score = score;
        a
    }

    #[test]
    fn test_breaking_within_window_wins() {
        let articles = vec![
            trending("hot", 99.0),
            breaking("b1", "2025-05-06T10:00:00Z"),
            breaking("old", "2025-05-06T05:00:00Z"),
            breaking("b2", "2025-05-06T06:00:00Z"),
        ];
        let set = select_slides(&articles, now(), &SliderConfig::default()).unwrap();
        assert_eq!(set.label, SlideLabel::Breaking);
        let ids: Vec<&str> = set.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[test]
    fn test_breaking_capped_at_max_slides() {
        let articles: Vec<Article> = (0..8)
            .map(|i| breaking(&format!("b{i}"), "2025-05-06T11:00:00Z"))
            .collect();
        let set = select_slides(&articles, now(), &SliderConfig::default()).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.articles[0].id, "b0");
    }

    #[test]
    fn test_falls_back_to_trending() {
        let articles = vec![
            trending("low", 1.0),
            breaking("stale", "2025-05-05T00:00:00Z"),
            trending("high", 12.0),
            trending("mid-a", 5.0),
            trending("mid-b", 5.0),
        ];
        let set = select_slides(&articles, now(), &SliderConfig::default()).unwrap();
        assert_eq!(set.label, SlideLabel::Trending);
        let ids: Vec<&str> = set.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid-a", "mid-b", "low", "stale"]);
    }

    #[test]
    fn test_breaking_without_date_does_not_qualify() {
        let mut undated = article("undated", "Undated", "not a date");
        undated.is_breaking = true;
        let set = select_slides(&[undated], now(), &SliderConfig::default()).unwrap();
        assert_eq!(set.label, SlideLabel::Trending);
    }

    #[test]
    fn test_empty_feed_hides_banner() {
        assert!(select_slides(&[], now(), &SliderConfig::default()).is_none());
    }
}
