//! HTML for the banner slider's managed subtree.
//!
//! The markup mirrors the engine's effective list one node per entry, so the
//! display index the engine reports is also the index of the node on screen.
//! The initial transform is expressed in percent of the container because the
//! pixel width is only known in the browser.

use crate::config::SiteConfig;
use crate::slider::{Layout, Slider};
use crate::utils::escape_html;
use std::fmt::Write;

/// Render the banner, or `None` when the section should be hidden.
pub fn render_banner(slider: &Slider, config: &SiteConfig) -> Option<String> {
    if slider.layout() == Layout::Hidden {
        return None;
    }
    let looping = slider.layout() == Layout::Looping;
    let label = slider
        .label()
        .map(|l| l.to_string())
        .unwrap_or_default();

    let mut html = String::new();
    writeln!(
        html,
        r#"<section class="banner-slider" data-label="{label}" data-slides="{}" aria-roledescription="carousel">"#,
        slider.len()
    )
    .unwrap();
    if !label.is_empty() {
        writeln!(
            html,
            r#"  <span class="banner-label banner-label-{}">{label}</span>"#,
            label.to_lowercase()
        )
        .unwrap();
    }

    writeln!(
        html,
        r#"  <div class="banner-track" style="transform: translateX({}%)">"#,
        -(slider.display_index() as i64 * 100)
    )
    .unwrap();
    for (index, slide) in slider.slides().iter().enumerate() {
        let article = &slide.article;
        let title = escape_html(article.display_title());
        let clone_attrs = if slide.is_clone {
            r#" data-clone="true" aria-hidden="true""#
        } else {
            ""
        };
        writeln!(
            html,
            r#"    <div class="banner-slide" data-index="{index}"{clone_attrs}>"#
        )
        .unwrap();
        writeln!(
            html,
            r#"      <a class="banner-link" href="{}" draggable="false"{}>"#,
            escape_html(&article.href(&config.site_root)),
            if slide.is_clone { r#" tabindex="-1""# } else { "" }
        )
        .unwrap();
        writeln!(
            html,
            r#"        <img src="{}" alt="{title}" draggable="false">"#,
            escape_html(article.image_or(&config.placeholder_image))
        )
        .unwrap();
        writeln!(
            html,
            r#"        <div class="banner-caption"><span class="banner-topic">{}</span><h2>{title}</h2></div>"#,
            escape_html(article.display_topic())
        )
        .unwrap();
        writeln!(html, "      </a>").unwrap();
        writeln!(html, "    </div>").unwrap();
    }
    writeln!(html, "  </div>").unwrap();

    if looping {
        writeln!(
            html,
            r#"  <button class="banner-control banner-prev" type="button" aria-label="Previous slide">&#10094;</button>"#
        )
        .unwrap();
        writeln!(
            html,
            r#"  <button class="banner-control banner-next" type="button" aria-label="Next slide">&#10095;</button>"#
        )
        .unwrap();
        writeln!(html, r#"  <div class="banner-dots">"#).unwrap();
        for i in 0..slider.len() {
            let current = i == slider.logical_index();
            writeln!(
                html,
                r#"    <button class="banner-control banner-dot{}" type="button" data-index="{i}" aria-label="Go to slide {}"{}></button>"#,
                if current { " active" } else { "" },
                i + 1,
                if current { r#" aria-current="true""# } else { "" }
            )
            .unwrap();
        }
        writeln!(html, "  </div>").unwrap();
    }
    writeln!(html, "</section>").unwrap();
    Some(html)
}
