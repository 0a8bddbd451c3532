//! Error types for feed loading, configuration and narration.
//!
//! Library-level failures are typed so callers can degrade gracefully: a
//! feed failure turns into a visible placeholder fragment rather than a crash,
//! and transient HTTP failures are retried by [`crate::feed::RetryLoad`].

use thiserror::Error;

/// Everything that can go wrong while obtaining the article feed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("feed endpoint {url} answered with status {status}")]
    Status { status: u16, url: String },

    #[error("feed is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("feed document has no `articles` array")]
    MissingArticles,

    #[error("could not read feed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid feed location {location}: {message}")]
    Location { location: String, message: String },
}

impl FeedError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Network(_) => true,
            FeedError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Failure to load the optional YAML site configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is invalid: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure to start narration of an article.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TtsError {
    #[error("speech synthesis is not available on this platform")]
    Unsupported,

    #[error("nothing to read: the article has no readable text")]
    NothingToRead,

    #[error("speech synthesis failed: {0}")]
    Synth(String),
}
