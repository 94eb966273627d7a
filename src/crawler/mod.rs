//! Crawler module for the two-level catalog walk
//!
//! This module contains the core mirroring logic, including:
//! - HTTP fetching and streaming downloads with retry
//! - Link extraction from index and category pages
//! - Politeness pacing between requests
//! - Overall walk coordination

mod coordinator;
mod fetcher;
mod pacing;
mod parser;
mod retry;

pub use coordinator::{run_mirror, Coordinator};
pub use fetcher::{build_http_client, download, fetch_text, DownloadOutcome};
pub use pacing::RequestPacer;
pub use parser::{
    extract_category_links, extract_file_links, extract_heading, CategoryLink, FileLink,
};
pub use retry::{classify_network, classify_status, FailureType, RetryDecision, RetryPolicy};
