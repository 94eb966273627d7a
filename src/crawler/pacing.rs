//! Politeness pacing between remote requests.
//!
//! Every outbound request is preceded by a configurable base delay plus a
//! uniform random jitter, so the mirrorer never bursts the remote server.
//! The pacer is owned by the coordinator; the fetcher itself has no timing
//! policy.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Applies the configured per-request delay floor.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    base: Duration,
    jitter: Duration,
}

impl RequestPacer {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.rate_limit_ms),
            Duration::from_millis(config.jitter_ms),
        )
    }

    /// Sleeps for the base delay plus a random jitter in `[0, jitter]`.
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_delay(&self) -> Duration {
        if self.base.is_zero() && self.jitter.is_zero() {
            return Duration::ZERO;
        }

        let jitter_ms = if self.jitter.is_zero() {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64)
        };

        self.base + Duration::from_millis(jitter_ms)
    }
}
