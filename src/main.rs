//! Sumi-Frontier main entry point
//!
//! This is the command-line interface for the Sumi-Frontier crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_frontier::config::{load_config_with_hash, validate, Config};
use sumi_frontier::crawler::crawl;
use sumi_frontier::output::{load_statistics, print_statistics};
use sumi_frontier::storage::open_store;
use tracing_subscriber::EnvFilter;

/// Sumi-Frontier: a crawler frontier with revisit delays and retries
///
/// Crawls from the configured seeds, fetching every URL in scope once. With a
/// database path configured, an interrupted crawl resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "sumi-frontier")]
#[command(version)]
#[command(about = "A resumable web crawler frontier", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (may be repeated)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, discarding previous state
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if !cli.seeds.is_empty() {
        config.seeds.extend(cli.seeds);
        validate(&config).context("Invalid --seed")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_frontier=info,warn"),
            1 => EnvFilter::new("sumi_frontier=debug,info"),
            2 => EnvFilter::new("sumi_frontier=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Frontier Dry Run ===\n");

    println!("Scheduler:");
    println!("  Input capacity: {}", config.scheduler.workers);
    println!("  Min revisit delay: {}ms", config.scheduler.min_revisit_delay);
    println!("  Retry delay: {}ms", config.scheduler.retry_delay);
    println!("  Max retry: {}", config.scheduler.max_retry);
    println!("  Wait queue capacity: {}", config.scheduler.queue_capacity);

    println!("\nFetcher:");
    println!("  Workers: {}", config.fetcher.workers);
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout);

    println!("\nStore:");
    match &config.store.database_path {
        Some(path) => println!("  SQLite: {}", path),
        None => println!("  In memory (not resumable)"),
    }

    println!("\nScope ({}):", config.policy.scope.len());
    if config.policy.scope.is_empty() {
        println!("  - seed hosts");
    }
    for pattern in &config.policy.scope {
        println!("  - {}", pattern);
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(path) = &config.store.database_path else {
        bail!("--stats needs store.database-path to be configured");
    };
    println!("Database: {}\n", path);

    let store = open_store(&config.store, false)?;
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else if config.store.database_path.is_some() {
        tracing::info!("Starting crawl (will resume pending URLs)");
    }
    tracing::info!("Seed URLs: {}", config.seeds.len());

    let store = open_store(&config.store, fresh).context("Failed to open store")?;
    crawl(config, store.clone()).await.context("Crawl failed")?;

    let stats = load_statistics(store.as_ref())?;
    tracing::info!(
        "Crawl stopped: {} pages fetched, {} URLs pending",
        stats.visits,
        stats.count(sumi_frontier::UrlStatus::Pending)
    );

    Ok(())
}
