use serde::Deserialize;

/// Main configuration structure for midi-mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// URL of the catalog index page; its path is also the category prefix
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// File extensions treated as downloadable leaf files
    #[serde(rename = "file-extensions", default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

/// Crawl pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum delay between remote requests (milliseconds)
    #[serde(rename = "rate-limit-ms", default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Upper bound of the random jitter added to each delay (milliseconds)
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional download attempts after the first failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Truncate discovered category/file lists to the first N entries.
    /// Negative means unlimited.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            jitter_ms: default_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            limit: default_limit(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the mirrorer
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the mirrorer
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the mirrorer
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory the mirrored tree is written under
    pub directory: String,
}

fn default_file_extensions() -> Vec<String> {
    vec!["mid".to_string(), "midi".to_string()]
}

fn default_rate_limit_ms() -> u64 {
    400
}

fn default_jitter_ms() -> u64 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_limit() -> i64 {
    -1
}
