//! `sitemap.xml` generation.
//!
//! # Entries
//!
//! | Page | lastmod | changefreq | priority |
//! |------|---------|------------|----------|
//! | Homepage | newest article (or today) | daily | 1.0 |
//! | `articles/*` | publication date | weekly | 0.8 |
//! | `digests/*.html` | file modification time | daily | 0.7 |
//!
//! Article links that do not live under `articles/` are skipped.

use crate::models::Article;
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::error::Error;
use std::io::Cursor;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// A digest page found on disk.
#[derive(Debug, Clone)]
pub struct DigestPage {
    pub file_name: String,
    pub modified: Option<DateTime<Utc>>,
}

/// Normalize the site base URL so relative joins append rather than replace.
pub fn parse_base_url(base: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/", base.trim_end_matches('/')))
}

/// Build the sitemap entries for the homepage, the articles and the digests.
pub fn sitemap_entries(
    base: &Url,
    articles: &[Article],
    digests: &[DigestPage],
    now: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let newest = articles.iter().filter_map(|a| a.published).max();
    let mut entries = vec![SitemapEntry {
        loc: base.to_string(),
        lastmod: Some(newest.unwrap_or(now).date_naive()),
        changefreq: "daily",
        priority: "1.0",
    }];

    for article in articles {
        let relative = article.link.trim_start_matches('/');
        if !relative.starts_with("articles/") {
            warn!(id = %article.id, link = %article.link, "Sitemap: link outside articles/; skipping");
            continue;
        }
        match base.join(relative) {
            Ok(loc) => entries.push(SitemapEntry {
                loc: loc.to_string(),
                lastmod: article.published.map(|p| p.date_naive()),
                changefreq: "weekly",
                priority: "0.8",
            }),
            Err(e) => warn!(id = %article.id, error = %e, "Sitemap: cannot resolve link"),
        }
    }

    for digest in digests {
        match base.join(&format!("digests/{}", digest.file_name)) {
            Ok(loc) => entries.push(SitemapEntry {
                loc: loc.to_string(),
                lastmod: digest.modified.map(|m| m.date_naive()),
                changefreq: "daily",
                priority: "0.7",
            }),
            Err(e) => warn!(file = %digest.file_name, error = %e, "Sitemap: cannot resolve digest"),
        }
    }
    entries
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Serialize entries as a sitemap document.
pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &entry.loc)?;
        if let Some(lastmod) = entry.lastmod {
            write_text_element(&mut writer, "lastmod", &lastmod.format("%Y-%m-%d").to_string())?;
        }
        write_text_element(&mut writer, "changefreq", entry.changefreq)?;
        write_text_element(&mut writer, "priority", entry.priority)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// List the `.html` digest pages in `dir`. A missing directory yields none.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn collect_digests(dir: &Path) -> Vec<DigestPage> {
    let mut pages = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            info!(error = %e, "No digest directory; no digest pages added");
            return pages;
        }
    };
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed reading digest directory");
                break;
            }
        };
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.ends_with(".html") {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(t) => Some(DateTime::<Utc>::from(t)),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Could not read digest modification time");
                None
            }
        };
        pages.push(DigestPage {
            file_name,
            modified,
        });
    }
    pages.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    info!(count = pages.len(), "Collected digest pages");
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::article;
    use crate::utils::parse_published;

    fn now() -> DateTime<Utc> {
        parse_published("2025-05-06T12:00:00Z").unwrap()
    }

    #[test]
    fn test_parse_base_url_adds_slash() {
        let base = parse_base_url("https://news.example.com/site").unwrap();
        assert_eq!(base.as_str(), "https://news.example.com/site/");
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_entries() {
        let base = parse_base_url("https://news.example.com").unwrap();
        let mut offsite = article("x", "X", "2025-05-01T00:00:00Z");
        offsite.link = "elsewhere/x.html".to_string();
        let articles = vec![
            article("a", "A", "2025-05-04T08:00:00Z"),
            article("b", "B", "2025-05-05T23:00:00Z"),
            offsite,
        ];
        let digests = vec![DigestPage {
            file_name: "weekly.html".to_string(),
            modified: None,
        }];

        let entries = sitemap_entries(&base, &articles, &digests, now());
        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://news.example.com/",
                "https://news.example.com/articles/a.html",
                "https://news.example.com/articles/b.html",
                "https://news.example.com/digests/weekly.html",
            ]
        );
        assert_eq!(entries[0].lastmod, NaiveDate::from_ymd_opt(2025, 5, 5));
        assert_eq!(entries[1].changefreq, "weekly");
        assert_eq!(entries[3].priority, "0.7");
    }

    #[test]
    fn test_homepage_lastmod_defaults_to_now() {
        let base = parse_base_url("https://news.example.com").unwrap();
        let entries = sitemap_entries(&base, &[], &[], now());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].lastmod, NaiveDate::from_ymd_opt(2025, 5, 6));
    }

    #[test]
    fn test_render_sitemap() {
        let entries = vec![SitemapEntry {
            loc: "https://news.example.com/articles/a.html?x=1&y=2".to_string(),
            lastmod: NaiveDate::from_ymd_opt(2025, 5, 6),
            changefreq: "weekly",
            priority: "0.8",
        }];
        let xml = render_sitemap(&entries).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://news.example.com/articles/a.html?x=1&amp;y=2</loc>"));
        assert!(xml.contains("<lastmod>2025-05-06</lastmod>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[tokio::test]
    async fn test_collect_digests() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.html"), "<h1>B</h1>").unwrap();
        std::fs::write(tmp.path().join("a.html"), "<h1>A</h1>").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "skip").unwrap();

        let pages = collect_digests(tmp.path()).await;
        let names: Vec<&str> = pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.html", "b.html"]);
        assert!(pages[0].modified.is_some());

        assert!(collect_digests(&tmp.path().join("missing")).await.is_empty());
    }
}
