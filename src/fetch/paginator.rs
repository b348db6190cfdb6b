//! Paginated record fetching.
//!
//! Pages are requested one at a time until the service returns an empty
//! page, the page ceiling is reached, or a request fails. Failures never
//! discard what was already fetched.

use crate::models::{is_falsy, Record};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Connection settings for the profile service.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: String,
    pub token: String,
    pub page_size: usize,
    pub max_pages: usize,
    pub timeout_seconds: u64,
    /// Whether to show a progress spinner.
    pub show_progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            page_size: 500,
            max_pages: 20,
            timeout_seconds: 60,
            show_progress: true,
        }
    }
}

/// Why a page request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("request for page {page} failed: {source}")]
    Transport {
        page: usize,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("page {page} returned HTTP {status}: {body}")]
    HttpStatus {
        page: usize,
        status: StatusCode,
        body: String,
    },

    /// The body was not a JSON array of records.
    #[error("page {page} returned a malformed response: {reason}")]
    Malformed { page: usize, reason: String },
}

impl FetchError {
    /// The page the error occurred on.
    pub fn page(&self) -> usize {
        match self {
            FetchError::Transport { page, .. }
            | FetchError::HttpStatus { page, .. }
            | FetchError::Malformed { page, .. } => *page,
        }
    }
}

/// How pagination ended.
#[derive(Debug)]
pub enum StopReason {
    /// A page came back empty.
    EndOfData,
    /// The page ceiling was reached.
    PageCeiling,
    /// A page request failed; earlier pages are kept.
    Failed(FetchError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfData => write!(f, "end of data"),
            StopReason::PageCeiling => write!(f, "page ceiling reached"),
            StopReason::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Records accumulated by a fetch run and how it ended.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Records in page order.
    pub records: Vec<Record>,
    /// Pages that returned records.
    pub pages_fetched: usize,
    pub stop: StopReason,
}

impl FetchOutcome {
    /// Returns the failure cause if the fetch stopped on an error.
    pub fn failure(&self) -> Option<&FetchError> {
        match &self.stop {
            StopReason::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of decoding one page body.
#[derive(Debug)]
enum Page {
    Records(Vec<Record>),
    Empty,
}

/// Decode a page body. Falsy JSON values mark the end of data.
fn decode_page(page: usize, body: &str) -> Result<Page, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        page,
        reason: format!("invalid JSON: {}", e),
    })?;

    if is_falsy(&value) {
        return Ok(Page::Empty);
    }

    match value {
        Value::Array(items) => Ok(Page::Records(items.into_iter().map(Record).collect())),
        other => Err(FetchError::Malformed {
            page,
            reason: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Longest error body kept in a `FetchError`, in characters.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Collapse whitespace and cut an error body down to `MAX_ERROR_BODY_CHARS`.
fn truncate_body(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Sequential page fetcher for the profile service.
pub struct Fetcher {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Fetch every page until end of data, the page ceiling, or an error.
    pub async fn fetch_all(&self) -> FetchOutcome {
        info!("Fetching records from {}", self.config.endpoint);

        let progress_bar = if self.config.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let mut records: Vec<Record> = Vec::new();
        let mut pages_fetched = 0;
        let mut page = 1;

        let stop = loop {
            if page > self.config.max_pages {
                break StopReason::PageCeiling;
            }

            if let Some(ref pb) = progress_bar {
                pb.set_message(format!(
                    "Fetching page {} ({} records so far)",
                    page,
                    records.len()
                ));
            }

            match self.fetch_page(page).await {
                Ok(Page::Records(batch)) => {
                    debug!("Page {} returned {} records", page, batch.len());
                    records.extend(batch);
                    pages_fetched += 1;
                    page += 1;
                }
                Ok(Page::Empty) => {
                    debug!("Page {} is empty", page);
                    break StopReason::EndOfData;
                }
                Err(e) => break StopReason::Failed(e),
            }
        };

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!("Fetched {} records", records.len()));
        }

        match &stop {
            StopReason::Failed(e) => warn!(
                page = e.page(),
                records = records.len(),
                "Fetching stopped early: {}",
                e
            ),
            StopReason::PageCeiling => info!(
                "Stopped at page ceiling of {} with {} records",
                self.config.max_pages,
                records.len()
            ),
            StopReason::EndOfData => info!("Fetched {} records", records.len()),
        }

        FetchOutcome {
            records,
            pages_fetched,
            stop,
        }
    }

    /// Request and decode a single page.
    async fn fetch_page(&self, page: usize) -> Result<Page, FetchError> {
        let response = self
            .http_client
            .get(&self.config.endpoint)
            .query(&[("limit", self.config.page_size), ("page", page)])
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                page,
                status,
                body: truncate_body(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        decode_page(page, &body)
    }
}
