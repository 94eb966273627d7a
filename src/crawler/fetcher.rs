//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the mirrorer, including:
//! - Building the HTTP client with an identifying user agent
//! - GET requests for HTML pages
//! - Streaming file downloads to a temporary path with an atomic rename
//! - Retry with exponential backoff for transient failures

use crate::config::UserAgentConfig;
use crate::crawler::retry::{classify_network, classify_status, FailureType, RetryDecision, RetryPolicy};
use crate::{MirrorError, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use url::Url;

/// Accept header favoring HTML, matching what browsers send for page loads.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Suffix appended to the destination filename while a transfer is in flight.
const PART_SUFFIX: &str = ".part";

/// Result of one download attempt against a destination path.
///
/// Download failures are reported through this value, never as an `Err`;
/// the run continues to the next item regardless of individual outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A new file was written to the destination.
    Downloaded,

    /// The destination already existed; no network request was made.
    Exists,

    /// Dry-run mode; no network request and no write.
    DryRun,

    /// All attempts failed; carries the last failure's message.
    Error(String),
}

impl DownloadOutcome {
    /// True when a new file was actually written.
    pub fn downloaded(&self) -> bool {
        matches!(self, Self::Downloaded)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded => write!(f, "downloaded"),
            Self::Exists => write!(f, "exists"),
            Self::DryRun => write!(f, "dry-run"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Builds the HTTP client used for every request in a run
///
/// The user agent identifies the mirrorer and how to reach its operator:
/// `name/version (+contact-url; contact-email)`.
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its body as text
///
/// Single GET with no retry: the pages this is used for (index, category
/// pages) are expected to be reachable, and a failure is handled by the
/// caller (fatal for the index, skip-and-continue for a category). The body
/// is decoded using the response's declared charset with undecodable bytes
/// replaced.
pub async fn fetch_text(client: &Client, url: &Url) -> Result<String> {
    debug!("GET {}", url);
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_page_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| classify_page_error(url, e))
}

fn classify_page_error(url: &Url, error: reqwest::Error) -> MirrorError {
    if error.is_timeout() {
        MirrorError::Timeout {
            url: url.to_string(),
        }
    } else {
        MirrorError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Downloads `url` to `dest`, streaming through a `.part` temporary file
///
/// Behavior, in order:
/// - if `dest` exists, returns [`DownloadOutcome::Exists`] without touching
///   the network (the resume mechanism);
/// - if `dry_run` is set, returns [`DownloadOutcome::DryRun`];
/// - otherwise streams the body to `<dest>.part` and renames it into place,
///   so a complete file is the only thing that can ever appear at `dest`.
///
/// Transient failures are retried per `retry`, with the partial temp file
/// removed before each new attempt. This function never returns an error;
/// exhausted retries and permanent failures become
/// [`DownloadOutcome::Error`].
pub async fn download(
    client: &Client,
    url: &Url,
    dest: &Path,
    retry: &RetryPolicy,
    dry_run: bool,
) -> DownloadOutcome {
    if fs::try_exists(dest).await.unwrap_or(false) {
        return DownloadOutcome::Exists;
    }
    if dry_run {
        return DownloadOutcome::DryRun;
    }

    if let Some(parent) = dest.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            return DownloadOutcome::Error(e.to_string());
        }
    }

    let tmp_path = part_path(dest);
    let mut attempt = 0u32;

    loop {
        match transfer(client, url, &tmp_path, dest).await {
            Ok(()) => return DownloadOutcome::Downloaded,
            Err(failure) => {
                // Best-effort cleanup of whatever the failed attempt left behind
                let _ = fs::remove_file(&tmp_path).await;

                match retry.should_retry(failure.kind, attempt) {
                    RetryDecision::Retry { delay } => {
                        warn!(
                            url = %url,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %failure.message,
                            "retrying download"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        return DownloadOutcome::Error(failure.message);
                    }
                }
            }
        }
    }
}

/// A single failed transfer attempt, classified for the retry policy.
struct TransferFailure {
    kind: FailureType,
    message: String,
}

fn io_failure(error: std::io::Error) -> TransferFailure {
    TransferFailure {
        kind: FailureType::Permanent,
        message: error.to_string(),
    }
}

/// One GET-and-stream attempt: temp file, chunked writes, flush, rename.
async fn transfer(
    client: &Client,
    url: &Url,
    tmp_path: &Path,
    dest: &Path,
) -> std::result::Result<(), TransferFailure> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| TransferFailure {
            kind: classify_network(&e),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransferFailure {
            kind: classify_status(status.as_u16()),
            message: format!("HTTP status {}", status),
        });
    }

    let file = File::create(tmp_path).await.map_err(io_failure)?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransferFailure {
            kind: classify_network(&e),
            message: e.to_string(),
        })?;
        writer.write_all(&chunk).await.map_err(io_failure)?;
    }

    writer.flush().await.map_err(io_failure)?;
    drop(writer);

    // The rename is what makes a file visible at dest: all or nothing
    fs::rename(tmp_path, dest).await.map_err(io_failure)?;
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}
