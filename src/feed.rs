//! Loading the article feed with exponential backoff retry logic.
//!
//! The feed is a static `all_articles.json` published next to the site. It
//! can be read straight from disk (local builds, tests) or fetched over HTTP
//! from the deployed site, in which case every request bypasses caches so a
//! freshly published feed is visible immediately.
//!
//! # Architecture
//!
//! - [`FeedSource`]: core trait, "give me the raw feed text"
//! - [`HttpFeed`]: cache-bypassing GET against a URL
//! - [`FileFeed`]: reads a local file
//! - [`RetryLoad`]: decorator that retries transient failures of any source
//!
//! # Retry Strategy
//!
//! Only failures for which [`FeedError::is_transient`] holds are retried
//! (network errors, 5xx, 429). A 404 or a malformed document fails at once.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::Feed;
use crate::utils::{looks_truncated, truncate_for_log};
use chrono::Utc;
use rand::{rng, Rng};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Something that can produce the raw feed document.
pub trait FeedSource {
    /// Fetch the feed text.
    ///
    /// # Errors
    ///
    /// A [`FeedError`] describing why the document could not be obtained.
    async fn load(&self) -> Result<String, FeedError>;
}

/// Fetches the feed over HTTP, defeating intermediate caches.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    url: Url,
}

impl HttpFeed {
    /// Create a fetcher for `url`.
    ///
    /// # Errors
    ///
    /// [`FeedError::Location`] when `url` does not parse, or
    /// [`FeedError::Network`] if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self, FeedError> {
        let url = Url::parse(url).map_err(|e| FeedError::Location {
            location: url.to_string(),
            message: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self { client, url })
    }

    /// The request URL with a `_=<millis>` cache-busting parameter appended.
    pub fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("_", &Utc::now().timestamp_millis().to_string());
        url
    }
}

impl FeedSource for HttpFeed {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn load(&self) -> Result<String, FeedError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(self.request_url())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Feed endpoint returned an error status");
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = resp.text().await?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Fetched feed"
        );
        Ok(body)
    }
}

/// Reads the feed from a local file.
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeed {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<String, FeedError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        info!(bytes = text.len(), "Read feed file");
        Ok(text)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FeedSource`].
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryLoad<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryLoad<T>
where
    T: FeedSource,
{
    /// Wrap `inner` with up to `max_retries` retries.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let source = HttpFeed::new("https://news.example.com/all_articles.json")?;
    /// let feed = RetryLoad::new(source, 3, Duration::from_millis(500)).load().await?;
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(10),
        }
    }

    pub fn from_config(inner: T, config: &FeedConfig) -> Self {
        Self::new(inner, config.max_retries, StdDuration::from_millis(config.base_delay_ms))
            .with_max_delay(StdDuration::from_millis(config.max_delay_ms))
    }

    pub fn with_max_delay(mut self, max_delay: StdDuration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryLoad<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLoad")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FeedSource for RetryLoad<T>
where
    T: FeedSource + fmt::Debug,
{
    #[instrument(level = "info", skip_all)]
    async fn load(&self) -> Result<String, FeedError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.load().await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() {
                        error!(attempt, error = %e, "load() failed permanently; not retrying");
                        return Err(e);
                    }
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "load() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "load() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Whether `location` names an HTTP(S) resource rather than a file.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Parse feed text, logging a cut-off download distinctly.
pub fn parse_feed(text: &str, location: &str) -> Result<Feed, FeedError> {
    Feed::parse(text).inspect_err(|e| {
        if let FeedError::Malformed(json_err) = e {
            if looks_truncated(json_err) {
                let tail_start = text.len().saturating_sub(120);
                let tail = text.get(tail_start..).unwrap_or(text);
                warn!(
                    location,
                    bytes = text.len(),
                    tail = %truncate_for_log(tail, 120),
                    "Feed looks truncated"
                );
            }
        }
    })
}

/// Load and parse the feed from a URL or a file path.
///
/// HTTP sources are wrapped in [`RetryLoad`] configured from `config`.
///
/// # Errors
///
/// Any [`FeedError`] from fetching or parsing.
#[instrument(level = "info", skip(config))]
pub async fn load_feed(location: &str, config: &FeedConfig) -> Result<Feed, FeedError> {
    let t0 = Instant::now();
    let text = if is_remote(location) {
        let source = HttpFeed::new(location)?;
        RetryLoad::from_config(source, config).load().await?
    } else {
        FileFeed::new(location).load().await?
    };
    let feed = parse_feed(&text, location)?;
    info!(
        articles = feed.articles.len(),
        elapsed_ms = t0.elapsed().as_millis() as u128,
        "Loaded feed"
    );
    Ok(feed)
}
