//! Run summaries and snapshot statistics
//!
//! This module provides the end-of-run summary printed after a crawl, and
//! the statistics shown by `--stats`.

use crate::output::snapshot::Snapshot;
use crate::state::{CategoryOutcome, CrawlStatus};
use std::collections::HashSet;

/// Outcome counts for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Categories whose pagination ran to the end with links
    pub complete: usize,

    /// Categories that yielded zero links
    pub empty: usize,

    /// Categories cut short by a fetch failure
    pub failed_partial: usize,

    /// Categories skipped because a valid snapshot already existed
    pub resumed: usize,

    /// Categories whose snapshot could not be written
    pub write_failures: usize,

    /// Product URLs across this run's snapshots
    pub total_product_urls: usize,

    /// Highest number of category crawls in flight at once
    pub peak_in_flight: usize,

    /// URLs of failed-partial categories
    pub failed_urls: Vec<String>,
}

impl RunSummary {
    /// Folds one category outcome into the counts
    pub fn record(&mut self, outcome: &CategoryOutcome) {
        match outcome.status() {
            CrawlStatus::Complete => self.complete += 1,
            CrawlStatus::Empty => self.empty += 1,
            CrawlStatus::FailedPartial => {
                self.failed_partial += 1;
                self.failed_urls.push(outcome.target.url.to_string());
            }
        }
        self.total_product_urls += outcome.product_urls.len();
    }

    /// Categories crawled in this run
    pub fn crawled(&self) -> usize {
        self.complete + self.empty + self.failed_partial
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Categories:");
    println!("  Complete: {}", summary.complete);
    println!("  Empty: {}", summary.empty);
    println!("  Failed (partial results kept): {}", summary.failed_partial);
    println!("  Resumed from previous run: {}", summary.resumed);
    if summary.write_failures > 0 {
        println!("  Snapshot write failures: {}", summary.write_failures);
    }
    println!();

    println!("Product URLs collected: {}", summary.total_product_urls);
    println!("Peak concurrent categories: {}", summary.peak_in_flight);

    if !summary.failed_urls.is_empty() {
        println!("\nFailed Categories ({}):", summary.failed_urls.len());
        for url in &summary.failed_urls {
            println!("  - {}", url);
        }
    }
}

/// Aggregate view over the snapshot directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStatistics {
    pub snapshots: usize,
    pub empty_snapshots: usize,
    /// Sum of every snapshot's URL count
    pub total_urls: usize,
    /// Distinct URLs across all snapshots
    pub unique_urls: usize,
    pub failed_categories: usize,
}

impl SnapshotStatistics {
    pub fn from_snapshots<'a>(
        snapshots: impl IntoIterator<Item = &'a Snapshot>,
        failed_categories: usize,
    ) -> Self {
        let mut stats = Self {
            failed_categories,
            ..Self::default()
        };
        let mut unique = HashSet::new();
        for snapshot in snapshots {
            stats.snapshots += 1;
            if snapshot.product_urls.is_empty() {
                stats.empty_snapshots += 1;
            }
            stats.total_urls += snapshot.product_urls.len();
            unique.extend(snapshot.product_urls.iter().map(String::as_str));
        }
        stats.unique_urls = unique.len();
        stats
    }
}

/// Prints snapshot and database statistics to stdout
///
/// `database` is `(category types, products)` when the database exists.
pub fn print_statistics(stats: &SnapshotStatistics, database: Option<(u64, u64)>) {
    println!("=== Harvest Statistics ===\n");

    println!("Snapshots:");
    println!("  Categories: {}", stats.snapshots);
    println!("  Empty categories: {}", stats.empty_snapshots);
    println!("  Failed categories: {}", stats.failed_categories);
    println!("  Product URLs: {} ({} unique)", stats.total_urls, stats.unique_urls);
    println!();

    match database {
        Some((category_types, products)) => {
            println!("Database:");
            println!("  Category types: {}", category_types);
            println!("  Products: {}", products);

            let coverage = if stats.unique_urls > 0 {
                (products as f64 / stats.unique_urls as f64) * 100.0
            } else {
                0.0
            };
            println!("  Ingest coverage: {:.1}%", coverage);
        }
        None => println!("Database: not created yet"),
    }
}
