//! Run counters and the final summary line.

use crate::crawler::DownloadOutcome;
use std::path::Path;

/// Counters accumulated over one mirror run.
///
/// Reset every run; idempotence across runs comes from destination-path
/// existence on disk, not from these counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Every file link encountered across all categories
    pub total_seen: u64,

    /// Successful new writes
    pub total_downloaded: u64,

    /// Skipped because the destination already existed
    pub skipped_existing: u64,

    /// Skipped because of the dry-run flag
    pub skipped_dry_run: u64,

    /// Downloads that failed after exhausting retries
    pub failed: u64,
}

impl RunStats {
    /// Creates a new stats tracker with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one processed file link and its outcome.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        self.total_seen += 1;
        match outcome {
            DownloadOutcome::Downloaded => self.total_downloaded += 1,
            DownloadOutcome::Exists => self.skipped_existing += 1,
            DownloadOutcome::DryRun => self.skipped_dry_run += 1,
            DownloadOutcome::Error(_) => self.failed += 1,
        }
    }
}

/// Prints the end-of-run summary to stdout.
pub fn print_summary(stats: &RunStats, output_root: &Path) {
    println!(
        "Done. Seen: {}, downloaded: {}, out: {}",
        stats.total_seen,
        stats.total_downloaded,
        output_root.display()
    );
    if stats.skipped_existing > 0 || stats.skipped_dry_run > 0 || stats.failed > 0 {
        println!(
            "  existing: {}, dry-run: {}, errors: {}",
            stats.skipped_existing, stats.skipped_dry_run, stats.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_every_outcome() {
        let mut stats = RunStats::new();
        stats.record(&DownloadOutcome::Downloaded);
        stats.record(&DownloadOutcome::Downloaded);
        stats.record(&DownloadOutcome::Exists);
        stats.record(&DownloadOutcome::DryRun);
        stats.record(&DownloadOutcome::Error("HTTP status 500".to_string()));

        assert_eq!(stats.total_seen, 5);
        assert_eq!(stats.total_downloaded, 2);
        assert_eq!(stats.skipped_existing, 1);
        assert_eq!(stats.skipped_dry_run, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn test_new_is_zeroed() {
        let stats = RunStats::new();
        assert_eq!(stats, RunStats::default());
        assert_eq!(stats.total_seen, 0);
    }
}
