//! Writing rendered output to disk.
//!
//! The `render` command fills an output directory that the static page
//! templates include from:
//!
//! ```text
//! output_dir/
//! ├── banner.html          # slider subtree (absent when hidden)
//! ├── banner.json          # slider snapshot for the page script
//! ├── latest.html          # card grid of every titled article
//! ├── topics/<topic>.html  # card grid per topic
//! └── related/<id>.html    # sidebar per article
//! ```

use crate::slider::{Effect, Layout, SlideLabel, Slider};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// What the page script needs to take over a pre-rendered banner.
#[derive(Debug, Serialize)]
pub struct BannerSnapshot {
    pub label: Option<SlideLabel>,
    pub layout: Layout,
    pub logical_index: usize,
    pub display_index: usize,
    pub slides: Vec<SnapshotSlide>,
    pub mount_effects: Vec<Effect>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotSlide {
    pub id: String,
    pub href: String,
    pub is_clone: bool,
}

impl BannerSnapshot {
    pub fn new(slider: &Slider, mount_effects: Vec<Effect>) -> Self {
        let slides = slider
            .slides()
            .iter()
            .enumerate()
            .map(|(i, slide)| SnapshotSlide {
                id: slide.article.id.clone(),
                href: slider.href_at(i).unwrap_or_default(),
                is_clone: slide.is_clone,
            })
            .collect();
        Self {
            label: slider.label(),
            layout: slider.layout(),
            logical_index: slider.logical_index(),
            display_index: slider.display_index(),
            slides,
            mount_effects,
        }
    }
}

async fn ensure_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    ensure_parent(path).await?;
    fs::write(path, json).await?;
    info!("Wrote JSON");
    Ok(())
}

/// Write an HTML fragment to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_fragment(html: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    ensure_parent(path).await?;
    fs::write(path, html).await?;
    info!(bytes = html.len(), "Wrote HTML fragment");
    Ok(())
}

/// File name for a per-topic or per-article fragment: lowercased,
/// runs of non-alphanumerics collapsed to `-`.
pub fn fragment_file_name(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "untitled.html".to_string()
    } else {
        format!("{slug}.html")
    }
}
