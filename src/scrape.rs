//! Batch URL-to-text conversion
//!
//! Every target of a batch yields exactly one [`ScrapeResult`], in input
//! order. A failing target never aborts the rest of the batch.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use futures::stream::{self, StreamExt};
use reqwest::Url;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, OutputConfig};
use crate::extract;

/// Why a single target could not be converted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScrapeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Raw body of a retrieved page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub content_type: Option<String>,
    pub body: String,
}

/// Where pages come from
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError>;
}

/// Outcome for one target of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeResult {
    Success {
        url: String,
        content: String,
        filename_suggestion: String,
    },
    Failure {
        url: String,
        error_message: String,
    },
}

// Flat records with a `success` flag rather than serde's enum tagging
impl Serialize for ScrapeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScrapeResult::Success {
                url,
                content,
                filename_suggestion,
            } => {
                let mut s = serializer.serialize_struct("ScrapeResult", 4)?;
                s.serialize_field("url", url)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("content", content)?;
                s.serialize_field("filename_suggestion", filename_suggestion)?;
                s.end()
            }
            ScrapeResult::Failure { url, error_message } => {
                let mut s = serializer.serialize_struct("ScrapeResult", 3)?;
                s.serialize_field("url", url)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error_message", error_message)?;
                s.end()
            }
        }
    }
}

/// HTTP page source backed by reqwest
pub struct HttpPageSource {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpPageSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.fetch.user_agent.clone())
            .timeout(Duration::from_millis(config.fetch.page_timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            timeout_ms: config.fetch.page_timeout_ms,
        })
    }

    fn classify(&self, e: reqwest::Error) -> ScrapeError {
        if e.is_timeout() {
            ScrapeError::Timeout(self.timeout_ms)
        } else {
            ScrapeError::Request(e.to_string())
        }
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(FetchedPage { content_type, body })
    }
}

/// Runs batches against a page source
pub struct Scraper<S> {
    source: S,
    max_concurrency: usize,
    timestamp_format: String,
    default_label: String,
}

impl<S: PageSource> Scraper<S> {
    pub fn new(source: S, config: &Config) -> Self {
        let mut timestamp_format = config.output.timestamp_format.clone();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            warn!(format = %timestamp_format, "Invalid timestamp format, using default");
            timestamp_format = OutputConfig::default().timestamp_format;
        }

        Self {
            source,
            max_concurrency: config.fetch.max_concurrency.max(1),
            timestamp_format,
            default_label: config.output.default_label.clone(),
        }
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Fetch and convert every URL; resolves only once the whole batch is done
    pub async fn scrape_batch(&self, urls: &[String], label: &str) -> Vec<ScrapeResult> {
        let timestamp = chrono::Local::now()
            .format(&self.timestamp_format)
            .to_string();

        debug!(count = urls.len(), label, "Starting batch");

        stream::iter(urls.iter().enumerate())
            .map(|(i, url)| {
                let timestamp = &timestamp;
                async move {
                    match self.source.fetch(url).await.and_then(page_to_text) {
                        Ok(content) => ScrapeResult::Success {
                            url: url.clone(),
                            content,
                            filename_suggestion: filename_suggestion(timestamp, url, label, i + 1),
                        },
                        Err(e) => {
                            warn!(url = %url, error = %e, "Failed to scrape");
                            ScrapeResult::Failure {
                                url: url.clone(),
                                error_message: e.to_string(),
                            }
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}

/// Reduce a fetched page to text, converting HTML to Markdown
fn page_to_text(page: FetchedPage) -> Result<String, ScrapeError> {
    let content_type = page
        .content_type
        .as_deref()
        .map(|ct| ct.to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.contains("html") || looks_like_html(&page.body) {
        return Ok(extract::html_to_markdown(&page.body));
    }

    let textual = content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("json")
        || content_type.contains("xml")
        || content_type.contains("javascript");

    if textual {
        Ok(page.body.trim().to_string())
    } else {
        Err(ScrapeError::UnsupportedContent(content_type))
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(64).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// `<timestamp>-<host>-<label>-<NN>.md`, host dots replaced by underscores
pub fn filename_suggestion(timestamp: &str, url: &str, label: &str, index: usize) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| "unknown".to_string())
        .replace('.', "_");

    let label = label.replace(['/', '\\'], "-");

    format!("{}-{}-{}-{:02}.md", timestamp, host, label, index)
}
