//! Driftnet main entry point
//!
//! This is the command-line interface for the driftnet release indexer.

use clap::Parser;
use driftnet::config::load_config_with_hash;
use driftnet::indexer::run_indexer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: an incremental release indexer
///
/// Driftnet polls a release listing on a fixed interval, walks the id
/// frontier to find releases that are not yet indexed, and fetches and
/// normalizes their detail pages into a SQLite record store.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version)]
#[command(about = "An incremental release indexer", long_about = None)]
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

    /// Show record counts from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    tracing::info!(
        "Indexing {} every {}s",
        config.site.base_url,
        config.poll.interval_secs
    );

    run_indexer(config).await?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Handles the --stats mode: shows record counts from the database
fn handle_stats(config: &driftnet::config::Config) -> anyhow::Result<()> {
    use driftnet::storage::{SqliteStorage, Storage};
    use std::path::Path;

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    println!("Database: {}\n", config.output.database_path);
    println!("Releases:   {}", storage.count_releases()?);
    println!("Categories: {}", storage.count_categories()?);
    println!("Uploaders:  {}", storage.count_uploaders()?);
    println!("Tags:       {}", storage.count_tags()?);

    Ok(())
}
