//! Crawl coordinator - the two-level mirror walk
//!
//! This module drives the whole run: fetch the index, extract category
//! links, then for each category fetch its page, extract file links, and
//! download each file into the category's folder. One linear pass, no
//! backtracking, with the politeness pacer applied between remote requests.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, download, fetch_text};
use crate::crawler::pacing::RequestPacer;
use crate::crawler::parser::{
    extract_category_links, extract_file_links, extract_heading, CategoryLink,
};
use crate::crawler::retry::RetryPolicy;
use crate::output::naming::{filename_from_url, slugify, SLUG_MAX_LEN};
use crate::output::stats::RunStats;
use crate::{MirrorError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main mirror coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    index_url: Url,
    pacer: RequestPacer,
    retry: RetryPolicy,
    output_root: PathBuf,
    dry_run: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Builds the HTTP client and parses the index URL; no network traffic
    /// happens until [`run`](Self::run).
    pub fn new(config: Config, dry_run: bool) -> Result<Self> {
        let index_url = Url::parse(&config.site.index_url)?;
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.timeout_secs),
        )?;
        let pacer = RequestPacer::from_config(&config.crawler);
        let retry = RetryPolicy::new(
            config.crawler.max_retries,
            Duration::from_millis(config.crawler.backoff_base_ms),
        );
        let output_root = PathBuf::from(&config.output.directory);

        Ok(Self {
            config,
            client,
            index_url,
            pacer,
            retry,
            output_root,
            dry_run,
        })
    }

    /// Runs the full mirror walk
    ///
    /// A failed index fetch or an index without categories is fatal; a
    /// failed category page or file download is logged and the run moves on
    /// to the next item.
    pub async fn run(&self) -> Result<RunStats> {
        if !self.dry_run {
            std::fs::create_dir_all(&self.output_root)?;
        }

        tracing::info!("Fetching index: {}", self.index_url);
        let index_html = fetch_text(&self.client, &self.index_url).await?;

        let mut categories = extract_category_links(
            &index_html,
            &self.index_url,
            &self.config.site.file_extensions,
        );
        if categories.is_empty() {
            return Err(MirrorError::NoCategories);
        }
        truncate_to_limit(&mut categories, self.config.crawler.limit);

        tracing::info!("Discovered {} categories", categories.len());

        let mut stats = RunStats::new();
        for category in &categories {
            self.pacer.wait().await;
            if let Err(e) = self.mirror_category(category, &mut stats).await {
                tracing::error!("Skipping category {}: {}", category.name, e);
            }
        }

        Ok(stats)
    }

    /// Mirrors a single category: fetch page, resolve display name, walk files
    async fn mirror_category(&self, category: &CategoryLink, stats: &mut RunStats) -> Result<()> {
        tracing::info!("Category: {}", category.name);
        let html = fetch_text(&self.client, &category.url).await?;

        // Prefer the page's own heading over the path-derived name
        let display_name = extract_heading(&html).unwrap_or_else(|| category.name.clone());

        let mut files = extract_file_links(
            &html,
            &display_name,
            &category.url,
            &self.config.site.file_extensions,
        );
        truncate_to_limit(&mut files, self.config.crawler.limit);
        tracing::info!("Found {} file links in {}", files.len(), display_name);

        let category_dir = self.output_root.join(slugify(&display_name, SLUG_MAX_LEN));
        if !self.dry_run {
            tokio::fs::create_dir_all(&category_dir).await?;
        }

        for file in &files {
            let dest = category_dir.join(filename_from_url(&file.url));
            let outcome = download(&self.client, &file.url, &dest, &self.retry, self.dry_run).await;
            tracing::info!("{} -> {} [{}]", file.title, dest.display(), outcome);
            stats.record(&outcome);
            self.pacer.wait().await;
        }

        Ok(())
    }
}

/// Runs the main mirror operation
///
/// # Example
///
/// ```no_run
/// use midi_mirror::config::load_config;
/// use midi_mirror::crawler::run_mirror;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_mirror(config, false).await?;
/// println!("downloaded {}", stats.total_downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(config: Config, dry_run: bool) -> Result<RunStats> {
    let coordinator = Coordinator::new(config, dry_run)?;
    coordinator.run().await
}

/// Truncates discovered lists to the first N entries; negative N is unlimited.
fn truncate_to_limit<T>(items: &mut Vec<T>, limit: i64) {
    if limit >= 0 {
        items.truncate(limit as usize);
    }
}
