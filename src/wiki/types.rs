//! Type definitions for the content source.

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Duration;

use crate::word_count;

/// A fetched article, ready to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub text: String,
    /// Page or API URL the text came from.
    pub source: String,
}

impl Article {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("topic is empty after removing punctuation")]
    EmptyTopic,
    #[error("page '{title}' not found. Try a more specific topic.")]
    NotFound { title: String },
    #[error("page '{title}' has no text content")]
    EmptyPage { title: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("failed to extract article from {url}: {reason}")]
    Extraction { url: String, reason: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Request(_) | FetchError::Timeout(_))
    }
}

/// MediaWiki `action=query&prop=extracts` response (`formatversion=2`).
#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    #[serde(default)]
    pub pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractPage {
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub extract: Option<String>,
}

// Constants
pub const API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const PAGE_URL: &str = "https://en.wikipedia.org/wiki/";
pub const USER_AGENT: &str = concat!("wikibrief/", env!("CARGO_PKG_VERSION"), " (article summarizer)");
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const MAX_RETRIES: usize = 3;
/// Characters of the original article shown to the user.
pub const DISPLAY_LIMIT: usize = 25_000;
/// Default cap on characters handed to the summarizer.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;
