//! # Awful News Deck
//!
//! The reader-facing half of a static news site. An upstream pipeline
//! publishes `all_articles.json`; this tool turns that feed into what the
//! homepage and article pages need.
//!
//! ## Features
//!
//! - Picks the banner articles (fresh breaking news, otherwise trending) and
//!   drives an infinitely looping, swipeable slider state machine
//! - Ranks articles for free-text search and for the related-articles sidebar
//! - Renders article cards, sidebars and the banner as HTML fragments
//! - Writes `sitemap.xml`
//! - Replays scripted pointer/timer sessions against the slider
//! - Dry-runs the "Listen" narration of an article page
//!
//! ## Usage
//!
//! ```sh
//! awful_news_deck --feed public/all_articles.json render -o public/fragments
//! ```

use chrono::{DateTime, Utc};
use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod feed;
mod models;
mod outputs;
mod scoring;
mod slider;
mod tts;
mod utils;

use cli::{Cli, Command};
use config::{load_config, SiteConfig};
use feed::load_feed;
use models::Feed;
use outputs::json::{fragment_file_name, write_fragment, write_json, BannerSnapshot};
use outputs::{banner, cards, sitemap};
use scoring::RelatedContext;
use slider::{select_slides, Script, SessionHost, Slider};
use tts::{readable_text, TranscriptSynth, TtsController};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_deck starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(feed = %args.feed, command = ?args.command, "Parsed CLI arguments");

    let mut config = load_config(args.config.as_deref()).await?;
    if let Some(site_root) = args.site_root {
        config.site_root = site_root;
    }
    let now = Utc::now();

    match args.command {
        Command::Banner => {
            let feed = load_feed(&args.feed, &config.feed).await?;
            let slides = select_slides(&feed.articles, now, &config.slider);
            let (slider, _) =
                Slider::mount(slides, 1200.0, config.slider.clone(), &config.site_root);
            match banner::render_banner(&slider, &config) {
                Some(html) => print!("{html}"),
                None => info!("No breaking or trending articles; banner hidden"),
            }
        }
        Command::Search { query, limit } => {
            let feed = load_feed(&args.feed, &config.feed).await?;
            let results = scoring::search(&feed.articles, &query);
            info!(query = %query, matches = results.len(), "Search complete");
            let shown: Vec<_> = results.into_iter().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Command::Related { id, body_height } => {
            let feed = load_feed(&args.feed, &config.feed).await?;
            let Some(article) = feed.find(&id) else {
                error!(id = %id, "Article not found in feed");
                return Err(format!("no article with id {id}").into());
            };
            let count = scoring::sidebar_item_count(body_height, &config.related);
            let items = scoring::related(
                &feed.articles,
                &RelatedContext::of(article),
                now,
                config.related.min_score,
                count,
            );
            info!(id = %id, count, found = items.len(), "Related articles ranked");
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Command::Topic { name } => {
            let feed = load_feed(&args.feed, &config.feed).await?;
            let matches = scoring::by_topic(&feed.articles, &name);
            info!(topic = %name, matches = matches.len(), "Topic filtered");
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Command::Render { output_dir, width } => {
            // Early check: ensure output dir is writable
            if let Err(e) = ensure_writable_dir(&output_dir).await {
                error!(
                    path = %output_dir,
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
            render_fragments(&args.feed, &config, Path::new(&output_dir), width, now).await?;
        }
        Command::Sitemap {
            base_url,
            output,
            digests_dir,
        } => {
            let feed = load_feed(&args.feed, &config.feed).await?;
            let base = sitemap::parse_base_url(&base_url)?;
            let digests = match &digests_dir {
                Some(dir) => sitemap::collect_digests(Path::new(dir)).await,
                None => Vec::new(),
            };
            let entries = sitemap::sitemap_entries(&base, &feed.articles, &digests, now);
            let xml = sitemap::render_sitemap(&entries)?;
            tokio::fs::write(&output, xml).await?;
            info!(path = %output, urls = entries.len(), "Wrote sitemap");
        }
        Command::Simulate { script, width } => {
            let text = tokio::fs::read_to_string(&script).await?;
            let script: Script = serde_yaml::from_str(&text)?;
            let feed = load_feed(&args.feed, &config.feed).await?;
            let slides = select_slides(&feed.articles, now, &config.slider);
            let (slider, effects) = Slider::mount(
                slides,
                width.unwrap_or(script.width),
                config.slider.clone(),
                &config.site_root,
            );
            let report = SessionHost::new(slider, effects).replay(&script);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Speak { html_file } => {
            let html = tokio::fs::read_to_string(&html_file).await?;
            let text = readable_text(&html);
            let mut tts = TtsController::new(TranscriptSynth::default());
            let updates = tts.toggle("article", &text)?;
            debug!(?updates, state = ?tts.state_of("article"), "Narration started");
            tts.finished();
            for utterance in &tts.synth().spoken {
                println!("{utterance}");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Fill `dir` from the feed at `location`.
///
/// A feed that cannot be loaded is not fatal: the banner and latest-articles
/// regions get a visible error message instead.
#[instrument(level = "info", skip(config, dir, now), fields(dir = %dir.display()))]
async fn render_fragments(
    location: &str,
    config: &SiteConfig,
    dir: &Path,
    width: f64,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    match load_feed(location, &config.feed).await {
        Ok(feed) => render_site(&feed, config, dir, width, now).await,
        Err(e) => {
            error!(error = %e, "Feed unavailable; writing error placeholders");
            let message = cards::render_error("Could not load articles. Please try again later.");
            write_fragment(&message, &dir.join("banner.html")).await?;
            write_fragment(&message, &dir.join("latest.html")).await?;
            Ok(())
        }
    }
}

/// Write every fragment the static pages include.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), articles = feed.articles.len()))]
async fn render_site(
    feed: &Feed,
    config: &SiteConfig,
    dir: &Path,
    width: f64,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    if feed.is_empty() {
        warn!("Feed has no usable articles; writing empty-state fragments");
    }

    // ---- Banner ----
    let slides = select_slides(&feed.articles, now, &config.slider);
    let (slider, effects) = Slider::mount(slides, width, config.slider.clone(), &config.site_root);
    match banner::render_banner(&slider, config) {
        Some(html) => write_fragment(&html, &dir.join("banner.html")).await?,
        None => {
            info!("Banner hidden; removing stale banner.html");
            if let Err(e) = tokio::fs::remove_file(dir.join("banner.html")).await {
                debug!(error = %e, "No previous banner.html");
            }
        }
    }
    write_json(&BannerSnapshot::new(&slider, effects), &dir.join("banner.json")).await?;

    // ---- Card grids ----
    let latest = cards::render_card_list(&feed.articles, config, "No articles yet.");
    write_fragment(&latest, &dir.join("latest.html")).await?;

    let topics = feed
        .articles
        .iter()
        .filter_map(|a| a.topic.as_deref())
        .unique_by(|t| t.to_lowercase())
        .collect::<Vec<_>>();
    for topic in &topics {
        let matches = scoring::by_topic(&feed.articles, topic);
        let html = cards::render_card_list(
            matches,
            config,
            &format!("No articles found for {topic}."),
        );
        write_fragment(&html, &dir.join("topics").join(fragment_file_name(topic))).await?;
    }

    // ---- Related sidebars ----
    let count = scoring::sidebar_item_count(None, &config.related);
    let mut written = 0usize;
    for article in &feed.articles {
        let items = scoring::related(
            &feed.articles,
            &RelatedContext::of(article),
            now,
            config.related.min_score,
            count,
        );
        let html = cards::render_sidebar(&items, config);
        let path = dir.join("related").join(fragment_file_name(&article.id));
        if let Err(e) = write_fragment(&html, &path).await {
            warn!(id = %article.id, error = %e, "Failed writing related sidebar");
            continue;
        }
        written += 1;
    }

    info!(
        topics = topics.len(),
        sidebars = written,
        banner = ?slider.layout(),
        "Rendered site fragments"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FEED: &str = r#"{"articles":[
        {"id":"a1","title":"Chip news","link":"articles/a1.html","topic":"AI & ML",
         "tags":["gpu"],"trend_score":9.0,"published_iso":"2025-05-06T10:00:00Z"},
        {"id":"a2","title":"More chips","link":"articles/a2.html","topic":"ai & ml",
         "tags":["gpu"],"trend_score":4.0,"published_iso":"2025-05-05T10:00:00Z"},
        {"id":"a3","title":"Rain","link":"articles/a3.html","topic":"Weather"}
    ]}"#;

    fn now() -> DateTime<Utc> {
        "2025-05-06T12:00:00Z".parse().unwrap()
    }

    fn write_feed(dir: &Path, json: &str) -> String {
        let path = dir.join("all_articles.json");
        fs::write(&path, json).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_render_writes_fragment_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let feed = write_feed(tmp.path(), FEED);
        let out = tmp.path().join("fragments");

        render_fragments(&feed, &SiteConfig::default(), &out, 1200.0, now())
            .await
            .unwrap();

        let banner = fs::read_to_string(out.join("banner.html")).unwrap();
        assert!(banner.contains("banner-slider"));
        assert!(out.join("banner.json").exists());
        let latest = fs::read_to_string(out.join("latest.html")).unwrap();
        assert!(latest.contains("article-grid"));
        assert!(latest.contains("Rain"));

        // "AI & ML" and "ai & ml" share one page
        let topics: Vec<_> = fs::read_dir(out.join("topics"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .sorted()
            .collect();
        assert_eq!(topics, vec!["ai-ml.html", "weather.html"]);
        let ai = fs::read_to_string(out.join("topics/ai-ml.html")).unwrap();
        assert!(ai.contains("Chip news") && ai.contains("More chips"));
        assert!(!ai.contains("Rain"));

        for id in ["a1", "a2", "a3"] {
            assert!(out.join("related").join(format!("{id}.html")).exists());
        }
    }

    #[tokio::test]
    async fn test_empty_feed_removes_stale_banner() {
        let tmp = tempfile::tempdir().unwrap();
        let feed = write_feed(tmp.path(), r#"{"articles": []}"#);
        let out = tmp.path().join("fragments");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("banner.html"), "<section>old</section>").unwrap();

        render_fragments(&feed, &SiteConfig::default(), &out, 1200.0, now())
            .await
            .unwrap();

        assert!(!out.join("banner.html").exists());
        let latest = fs::read_to_string(out.join("latest.html")).unwrap();
        assert!(latest.contains("No articles yet."));
        assert!(!latest.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn test_unreachable_feed_writes_error_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.json");
        let out = tmp.path().join("fragments");

        render_fragments(
            missing.to_str().unwrap(),
            &SiteConfig::default(),
            &out,
            1200.0,
            now(),
        )
        .await
        .unwrap();

        for name in ["banner.html", "latest.html"] {
            let html = fs::read_to_string(out.join(name)).unwrap();
            assert!(html.contains("role=\"alert\""), "{name}: {html}");
            assert!(html.contains("Could not load articles."));
        }
        assert!(!out.join("banner.json").exists());
    }
}
