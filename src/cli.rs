//! Command-line interface definitions for Awful News Deck.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. The feed location and site root can also come from the environment.

use clap::{Parser, Subcommand};

/// Command-line arguments for Awful News Deck.
///
/// # Examples
///
/// ```sh
/// # Render every fragment the static pages include
/// awful_news_deck --feed public/all_articles.json render -o public/fragments
///
/// # Search the deployed feed
/// awful_news_deck --feed https://news.example.com/all_articles.json search "rust compiler"
///
/// # Replay a scripted slider session
/// awful_news_deck simulate sessions/swipe.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path or http(s) URL of all_articles.json
    #[arg(short, long, global = true, env = "NEWS_FEED", default_value = "public/all_articles.json")]
    pub feed: String,

    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Site root that article links are joined to (overrides config)
    #[arg(long, global = true, env = "NEWS_SITE_ROOT")]
    pub site_root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print the banner slider HTML for the current feed
    Banner,

    /// Rank articles against a free-text query
    Search {
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List articles related to the given article id
    Related {
        id: String,

        /// Height of the article body in pixels, used to size the sidebar
        #[arg(long)]
        body_height: Option<f64>,
    },

    /// List articles whose topic or tags match
    Topic { name: String },

    /// Write banner, card and sidebar fragments into a directory
    Render {
        #[arg(short, long)]
        output_dir: String,

        /// Container width used to mount the slider
        #[arg(long, default_value_t = 1200.0)]
        width: f64,
    },

    /// Write sitemap.xml
    Sitemap {
        /// Public base URL of the site
        #[arg(short, long)]
        base_url: String,

        #[arg(short, long, default_value = "sitemap.xml")]
        output: String,

        /// Directory of digest .html pages to include
        #[arg(long)]
        digests_dir: Option<String>,
    },

    /// Replay a YAML pointer/timer script against the slider
    Simulate {
        script: String,

        /// Container width, overriding the script's own
        #[arg(long)]
        width: Option<f64>,
    },

    /// Dry-run narration of an article page
    Speak { html_file: String },
}
