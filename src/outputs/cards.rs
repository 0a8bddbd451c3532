//! HTML fragments for article cards, sidebar items and placeholders.
//!
//! Fragments are dropped into the static page templates, so every value
//! coming from the feed is escaped here.
//!
//! # Card Structure
//!
//! ```text
//! article.article-card[data-article-id]
//! ├── a.article-card-link[href]
//! │   ├── div.article-card-image > img
//! │   └── div.article-card-content
//! │       ├── span.article-card-topic
//! │       ├── h3
//! │       ├── p.article-card-summary
//! │       └── time[datetime]
//! ├── div.article-card-tags > span.tag-item > a   (when tagged)
//! └── button.listen-button[data-audio]            (when audio exists)
//! ```
//!
//! Tags and the listen button sit outside the card link; anchors and
//! buttons cannot nest inside an anchor.

use crate::config::SiteConfig;
use crate::models::Article;
use crate::scoring::Scored;
use crate::tts::PlaybackState;
use crate::utils::{display_date, escape_html, join_site_root};
use std::fmt::Write;
use tracing::warn;

/// Render one article card.
pub fn render_card(article: &Article, config: &SiteConfig) -> String {
    let mut html = String::new();
    let href = article.href(&config.site_root);
    let title = escape_html(article.display_title());

    writeln!(
        html,
        r#"<article class="article-card" data-article-id="{}">"#,
        escape_html(&article.id)
    )
    .unwrap();
    writeln!(
        html,
        r#"  <a class="article-card-link" href="{}">"#,
        escape_html(&href)
    )
    .unwrap();
    writeln!(
        html,
        r#"    <div class="article-card-image"><img src="{}" alt="{}" loading="lazy"></div>"#,
        escape_html(article.image_or(&config.placeholder_image)),
        title
    )
    .unwrap();
    writeln!(html, r#"    <div class="article-card-content">"#).unwrap();
    writeln!(
        html,
        r#"      <span class="article-card-topic">{}</span>"#,
        escape_html(article.display_topic())
    )
    .unwrap();
    writeln!(html, "      <h3>{}</h3>", title).unwrap();
    if !article.summary().is_empty() {
        writeln!(
            html,
            r#"      <p class="article-card-summary">{}</p>"#,
            escape_html(article.summary())
        )
        .unwrap();
    }
    if let (Some(published), Some(iso)) = (&article.published, &article.published_iso) {
        writeln!(
            html,
            r#"      <time datetime="{}">{}</time>"#,
            escape_html(iso),
            display_date(published)
        )
        .unwrap();
    }
    writeln!(html, "    </div>").unwrap();
    writeln!(html, "  </a>").unwrap();
    if !article.tags.is_empty() {
        writeln!(
            html,
            r#"  <div class="article-card-tags">{}</div>"#,
            render_tags(&article.tags, config)
        )
        .unwrap();
    }
    if let Some(audio) = &article.audio_url {
        writeln!(
            html,
            r#"  <button type="button" class="listen-button" data-article-id="{}" data-audio="{}">{}</button>"#,
            escape_html(&article.id),
            escape_html(audio),
            PlaybackState::Idle.label()
        )
        .unwrap();
    }
    writeln!(html, "</article>").unwrap();
    html
}

/// Render a list of cards inside a grid.
///
/// Articles without a title are left out (and logged); an empty result
/// renders the placeholder instead of an empty grid.
pub fn render_card_list<'a>(
    articles: impl IntoIterator<Item = &'a Article>,
    config: &SiteConfig,
    empty_message: &str,
) -> String {
    let mut cards = String::new();
    let mut rendered = 0usize;
    for article in articles {
        if article.title.is_none() {
            warn!(id = %article.id, "Skipping card for article without title");
            continue;
        }
        cards.push_str(&render_card(article, config));
        rendered += 1;
    }

    if rendered == 0 {
        return render_placeholder(empty_message);
    }
    format!("<div class=\"article-grid\">\n{cards}</div>\n")
}

/// Render the related-articles sidebar list.
pub fn render_sidebar(items: &[Scored<'_, f64>], config: &SiteConfig) -> String {
    let mut html = String::new();
    let mut rendered = 0usize;
    for item in items {
        let article = item.article;
        if article.title.is_none() {
            warn!(id = %article.id, "Skipping sidebar item for article without title");
            continue;
        }
        if rendered == 0 {
            writeln!(html, r#"<ul class="related-articles">"#).unwrap();
        }
        writeln!(
            html,
            r#"  <li><a href="{}"><img src="{}" alt="" loading="lazy"><span>{}</span></a></li>"#,
            escape_html(&article.href(&config.site_root)),
            escape_html(article.image_or(&config.placeholder_image)),
            escape_html(article.display_title())
        )
        .unwrap();
        rendered += 1;
    }

    if rendered == 0 {
        return render_placeholder("No related articles found.");
    }
    writeln!(html, "</ul>").unwrap();
    html
}

/// Links to the topic pages of each tag.
pub fn render_tags(tags: &[String], config: &SiteConfig) -> String {
    tags.iter()
        .map(|tag| {
            let href = join_site_root(
                &config.site_root,
                &format!("topic.html?name={}", urlencoding::encode(tag)),
            );
            format!(
                r#"<span class="tag-item"><a href="{}">{}</a></span>"#,
                escape_html(&href),
                escape_html(tag)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A neutral message shown where a list has nothing to display.
pub fn render_placeholder(message: &str) -> String {
    format!(
        "<p class=\"placeholder\">{}</p>\n",
        escape_html(message)
    )
}

/// A visible error message for a region whose data could not be loaded.
pub fn render_error(message: &str) -> String {
    format!(
        "<p class=\"placeholder error\" role=\"alert\">{}</p>\n",
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::article;
    use scraper::{Html, Selector};

    fn select_text(html: &str, css: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(html);
        let selector = Selector::parse(css).unwrap();
        fragment
            .select(&selector)
            .map(|e| e.text().collect::<String>())
            .collect()
    }

    fn select_attr(html: &str, css: &str, attr: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(html);
        let selector = Selector::parse(css).unwrap();
        fragment
            .select(&selector)
            .filter_map(|e| e.value().attr(attr).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_card_structure_and_escaping() {
        let mut a = article("a1", "Chips & <Dips>", "2025-05-06T14:30:00Z");
        a.topic = Some("Hardware".to_string());
        a.summary_short = Some("Fast \"new\" silicon".to_string());
        a.tags = vec!["GPU".to_string(), "AI & ML".to_string()];
        let html = render_card(&a, &SiteConfig::default());

        assert_eq!(select_text(&html, "h3"), vec!["Chips & <Dips>"]);
        assert_eq!(select_text(&html, ".article-card-topic"), vec!["Hardware"]);
        assert_eq!(
            select_text(&html, ".article-card-summary"),
            vec!["Fast \"new\" silicon"]
        );
        assert_eq!(
            select_attr(&html, "a.article-card-link", "href"),
            vec!["/articles/a1.html"]
        );
        assert_eq!(
            select_attr(&html, ".article-card-tags a", "href"),
            vec!["/topic.html?name=GPU", "/topic.html?name=AI%20%26%20ML"]
        );
        assert_eq!(select_text(&html, ".tag-item"), vec!["GPU", "AI & ML"]);
        assert_eq!(select_attr(&html, "time", "datetime"), vec!["2025-05-06T14:30:00Z"]);
        assert_eq!(select_text(&html, "time"), vec!["May 6, 2025"]);
        assert_eq!(
            select_attr(&html, "article", "data-article-id"),
            vec!["a1"]
        );
    }

    #[test]
    fn test_card_defaults() {
        let mut a = article("a1", "T", "not a date");
        a.title = None;
        let config = SiteConfig::default();
        let html = render_card(&a, &config);
        assert_eq!(select_text(&html, "h3"), vec!["Untitled"]);
        assert_eq!(select_text(&html, ".article-card-topic"), vec!["News"]);
        assert_eq!(select_attr(&html, "img", "src"), vec![config.placeholder_image.clone()]);
        assert!(select_text(&html, "time").is_empty());
        assert!(select_text(&html, ".article-card-tags").is_empty());
        assert!(select_text(&html, "button").is_empty());
    }

    #[test]
    fn test_card_listen_button_carries_audio() {
        let mut a = article("a1", "Podcast", "2025-05-06T00:00:00Z");
        a.audio_url = Some("/audio/a1.mp3?v=1&q=hi".to_string());
        let html = render_card(&a, &SiteConfig::default());
        assert_eq!(
            select_attr(&html, "button.listen-button", "data-audio"),
            vec!["/audio/a1.mp3?v=1&q=hi"]
        );
        assert_eq!(select_text(&html, "button.listen-button"), vec!["Listen"]);
    }

    #[test]
    fn test_card_list_skips_untitled_and_uses_placeholder() {
        let config = SiteConfig::default();
        let mut untitled = article("u", "U", "2025-05-06T00:00:00Z");
        untitled.title = None;
        let kept = article("k", "Kept", "2025-05-06T00:00:00Z");

        let html = render_card_list([&untitled, &kept], &config, "Nothing here.");
        assert_eq!(select_text(&html, "h3"), vec!["Kept"]);

        let html = render_card_list([&untitled], &config, "Nothing here.");
        assert_eq!(select_text(&html, "p.placeholder"), vec!["Nothing here."]);
    }

    #[test]
    fn test_sidebar() {
        let config = SiteConfig::default();
        let a = article("a", "Related one", "2025-05-06T00:00:00Z");
        let items = vec![Scored { score: 510.0, article: &a }];
        let html = render_sidebar(&items, &config);
        assert_eq!(select_text(&html, "li span"), vec!["Related one"]);

        let empty = render_sidebar(&[], &config);
        assert!(empty.contains("No related articles found."));
    }

    #[test]
    fn test_tags_link_to_topic_pages() {
        let html = render_tags(&["AI & ML".to_string()], &SiteConfig::default());
        assert_eq!(
            select_attr(&html, "a", "href"),
            vec!["/topic.html?name=AI%20%26%20ML"]
        );
        assert_eq!(select_text(&html, "a"), vec!["AI & ML"]);
    }

    #[test]
    fn test_error_placeholder_is_escaped() {
        let html = render_error("feed <down>");
        assert!(html.contains("feed &lt;down&gt;"));
        assert!(html.contains("role=\"alert\""));
    }
}
