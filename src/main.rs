//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product
//! catalog harvester.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::run_crawl;
use catalog_harvest::ingest::{print_ingest_summary, run_ingest};
use catalog_harvest::output::{
    load_snapshots, print_statistics, print_summary, read_failed_log, SnapshotStatistics,
};
use catalog_harvest::storage::{open_store, CatalogStore};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a polite product catalog harvester
///
/// Catalog-Harvest resolves a shop's category menu, walks every category's
/// paginated listing to collect product URLs, and stores one resumable JSON
/// snapshot per category. The ingest mode turns snapshots into product rows.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite product catalog harvester", long_about = None)]
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

    /// Skip categories finished by a previous run (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Recrawl every category, discarding existing snapshots
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "ingest"])]
    dry_run: bool,

    /// Show snapshot and database statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "ingest"])]
    stats: bool,

    /// Fetch product pages listed in the snapshots and store them in the database
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    ingest: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.ingest {
        handle_ingest(&config).await?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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
    let crawler = &config.crawler;

    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Root URL: {}", config.site.root_url);
    println!("  Page parameter: {}", config.site.page_param);

    println!("\nCrawler:");
    println!("  Concurrency limit: {}", crawler.concurrency_limit);
    println!(
        "  Delay between pages: {:.1}-{:.1}s",
        crawler.delay_between_pages.min, crawler.delay_between_pages.max
    );
    println!(
        "  Delay between categories: {:.1}-{:.1}s",
        crawler.delay_between_categories.min, crawler.delay_between_categories.max
    );
    println!("  Request timeout: {}s", crawler.request_timeout_seconds);
    println!("  Max pages per category: {}", crawler.max_pages_per_category);
    println!("  Crawl level: {:?}", crawler.crawl_level);

    println!("\nOutput:");
    println!("  Snapshots: {}", config.output.snapshot_dir);
    println!("  Structure: {}", config.output.structure_path);
    println!("  Database: {}", config.output.database_path);

    println!("\nIngest:");
    println!("  Concurrency limit: {}", config.ingest.concurrency_limit);
    println!("  Delay before request: {:.1}s", config.ingest.delay_before_request);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes snapshots and the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let snapshot_dir = Path::new(&config.output.snapshot_dir);
    let snapshots = load_snapshots(snapshot_dir)?;
    let failed = read_failed_log(snapshot_dir)?;
    let stats = SnapshotStatistics::from_snapshots(snapshots.iter().map(|(_, s)| s), failed.len());

    let database_path = Path::new(&config.output.database_path);
    let database = if database_path.exists() {
        let store = open_store(database_path)
            .with_context(|| format!("failed to open {}", database_path.display()))?;
        Some((store.count_category_types()?, store.count_products()?))
    } else {
        None
    };

    print_statistics(&stats, database);
    Ok(())
}

/// Handles the --ingest mode
async fn handle_ingest(config: &Config) -> anyhow::Result<()> {
    let summary = run_ingest(config).await.context("ingest failed")?;
    print_ingest_summary(&summary);
    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh harvest (existing snapshots are discarded)");
    } else {
        tracing::info!("Starting harvest (finished categories are resumed)");
    }

    let summary = run_crawl(config, fresh).await.context("harvest failed")?;
    print_summary(&summary);
    Ok(())
}
