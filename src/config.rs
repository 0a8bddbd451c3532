//! Site configuration and the tuning constants of the banner slider.
//!
//! Every value has a default, so the YAML file passed with `--config` only
//! needs to name what it overrides:
//!
//! ```yaml
//! site_root: /
//! slider:
//!   autoplay_period_ms: 5000
//! related:
//!   max_items: 6
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Horizontal movement (px) after which a pointer gesture counts as a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;
/// A press released within this window without dragging is a click.
pub const CLICK_WINDOW_MS: u64 = 250;
/// Net horizontal displacement (px) at release that advances the slider.
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;
/// Autoplay advances the banner once per period.
pub const AUTOPLAY_PERIOD_MS: u64 = 7_000;
/// Duration of the animated track transform.
pub const TRANSITION_MS: u64 = 500;
/// Upper bound on slides shown in the banner.
pub const MAX_SLIDES: usize = 5;
/// Breaking articles older than this are not featured as breaking.
pub const BREAKING_WINDOW_HOURS: i64 = 6;

/// Related-articles sidebar defaults.
pub const RELATED_DEFAULT_ITEMS: usize = 5;
pub const RELATED_MAX_ITEMS: usize = 10;
pub const RELATED_MIN_SCORE: f64 = 10.0;
pub const SIDEBAR_ITEM_HEIGHT_PX: f64 = 90.0;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/800x450?text=News";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root that article links are resolved against.
    pub site_root: String,
    /// Image used when an article has none.
    pub placeholder_image: String,
    pub slider: SliderConfig,
    pub related: RelatedConfig,
    pub feed: FeedConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_root: "/".to_string(),
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            slider: SliderConfig::default(),
            related: RelatedConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

/// Gesture thresholds and timings for the banner slider.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SliderConfig {
    pub drag_threshold_px: f64,
    pub click_window_ms: u64,
    pub swipe_threshold_px: f64,
    pub autoplay_period_ms: u64,
    pub transition_ms: u64,
    pub max_slides: usize,
    pub breaking_window_hours: i64,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DRAG_THRESHOLD_PX,
            click_window_ms: CLICK_WINDOW_MS,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
            autoplay_period_ms: AUTOPLAY_PERIOD_MS,
            transition_ms: TRANSITION_MS,
            max_slides: MAX_SLIDES,
            breaking_window_hours: BREAKING_WINDOW_HOURS,
        }
    }
}

impl SliderConfig {
    pub fn click_window(&self) -> Duration {
        Duration::from_millis(self.click_window_ms)
    }

    pub fn autoplay_period(&self) -> Duration {
        Duration::from_millis(self.autoplay_period_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Related-articles sidebar sizing and cutoffs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelatedConfig {
    /// Item count used when no body height is known.
    pub default_items: usize,
    /// Upper clamp for the height-derived item count.
    pub max_items: usize,
    /// Candidates scoring below this are dropped.
    pub min_score: f64,
    /// Assumed rendered height of one sidebar item.
    pub item_height_px: f64,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            default_items: RELATED_DEFAULT_ITEMS,
            max_items: RELATED_MAX_ITEMS,
            min_score: RELATED_MIN_SCORE,
            item_height_px: SIDEBAR_ITEM_HEIGHT_PX,
        }
    }
}

/// Retry policy for HTTP feed loads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Load a [`SiteConfig`] from a YAML file, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<SiteConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(SiteConfig::default());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    info!(path, site_root = %config.site_root, "Loaded site configuration");
    Ok(config)
}

/// Parse YAML text into a [`SiteConfig`]; an empty document yields the defaults.
pub fn parse_config(text: &str) -> Result<SiteConfig, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(SiteConfig::default());
    }
    serde_yaml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = SiteConfig::default();
        assert_eq!(config.slider.drag_threshold_px, 5.0);
        assert_eq!(config.slider.click_window(), Duration::from_millis(250));
        assert_eq!(config.slider.swipe_threshold_px, 50.0);
        assert_eq!(config.slider.autoplay_period(), Duration::from_secs(7));
        assert_eq!(config.slider.max_slides, 5);
        assert_eq!(config.related.default_items, 5);
        assert_eq!(config.site_root, "/");
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
site_root: https://news.example.com/
slider:
  autoplay_period_ms: 5000
related:
  max_items: 8
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.site_root, "https://news.example.com/");
        assert_eq!(config.slider.autoplay_period_ms, 5000);
        assert_eq!(config.slider.swipe_threshold_px, 50.0);
        assert_eq!(config.related.max_items, 8);
        assert_eq!(config.related.default_items, 5);
        assert_eq!(config.feed, FeedConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = parse_config("  \n").unwrap();
        assert_eq!(config.slider, SliderConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(parse_config("slider: [1, 2").is_err());
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let err = load_config(Some("/definitely/not/here.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_config_none_is_default() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config.placeholder_image, PLACEHOLDER_IMAGE);
    }
}
