//! midi-mirror main entry point
//!
//! This is the command-line interface for the midi-mirror catalog mirrorer.

use clap::Parser;
use midi_mirror::config::load_config_with_hash;
use midi_mirror::crawler::run_mirror;
use midi_mirror::output::print_summary;
use midi_mirror::MirrorError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status used when the index page yields no categories, which almost
/// always means the site markup changed under us.
const EXIT_NO_CATEGORIES: u8 = 2;

/// midi-mirror: a polite MIDI catalog mirrorer
///
/// midi-mirror walks a catalog index page, opens each series page it links
/// to, and downloads the MIDI files it finds into one folder per series.
/// Existing files are never re-downloaded, so interrupted runs can simply be
/// restarted.
#[derive(Parser, Debug)]
#[command(name = "midi-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a MIDI catalog site into per-series folders", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Walk the site without writing or downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Only process the first N categories and first N files per category
    #[arg(long, value_name = "N")]
    limit: Option<i64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(limit) = cli.limit {
        config.crawler.limit = limit;
    }
    if cli.dry_run {
        tracing::info!("Dry run: nothing will be written or downloaded");
    }

    let output_root = PathBuf::from(&config.output.directory);

    match run_mirror(config, cli.dry_run).await {
        Ok(stats) => {
            print_summary(&stats, &output_root);
            ExitCode::SUCCESS
        }
        Err(MirrorError::NoCategories) => {
            tracing::error!("No categories found; site markup may have changed");
            ExitCode::from(EXIT_NO_CATEGORIES)
        }
        Err(e) => {
            tracing::error!("Mirror run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("midi_mirror=info,warn"),
            1 => EnvFilter::new("midi_mirror=debug,info"),
            2 => EnvFilter::new("midi_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
