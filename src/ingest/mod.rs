//! Detail ingest: snapshots in, product rows out
//!
//! Reads every category snapshot, fetches each distinct product page once,
//! extracts its fields, and upserts category types and products into SQLite.
//! Failures are counted per product and never abort the ingest.

mod extractor;

pub use extractor::{extract_product, ProductRecord};

use crate::config::{CompiledSelectors, Config, DelayRange};
use crate::crawler::{build_http_client, fetch_html, polite_pause, AdmissionGate};
use crate::output::{load_snapshots, read_structure, Snapshot};
use crate::state::CategoryTree;
use crate::storage::{open_store, CatalogStore, ProductRow, StorageResult};
use crate::HarvestError;
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// A product page waiting to be ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTask {
    pub url: Url,
    pub category_label: String,
}

/// Counts for one ingest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub snapshots: usize,
    pub products_queued: usize,
    pub stored: usize,
    pub skipped_without_title: usize,
    pub fetch_failures: usize,
    pub storage_failures: usize,
}

enum ProductResult {
    Stored,
    NoTitle,
    FetchFailed,
    StorageFailed,
}

/// Human label for a snapshot's category
///
/// Looked up by category URL in the structure tree; the slug is the fallback.
pub fn category_label(snapshot: &Snapshot, tree: Option<&CategoryTree>) -> String {
    tree.zip(Url::parse(&snapshot.category_url).ok())
        .and_then(|(tree, url)| tree.find_by_url(&url).map(|node| node.name.clone()))
        .unwrap_or_else(|| snapshot.category_name_slug.clone())
}

/// Flattens snapshots into one task per distinct product URL
///
/// A URL listed under several categories keeps the label of the first
/// snapshot it appears in.
pub fn plan_tasks<'a>(
    snapshots: impl IntoIterator<Item = &'a Snapshot>,
    tree: Option<&CategoryTree>,
) -> Vec<IngestTask> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for snapshot in snapshots {
        let label = category_label(snapshot, tree);
        for raw in &snapshot.product_urls {
            let url = match Url::parse(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping malformed product URL '{}': {}", raw, e);
                    continue;
                }
            };
            if seen.insert(url.as_str().to_string()) {
                tasks.push(IngestTask {
                    url,
                    category_label: label.clone(),
                });
            }
        }
    }

    tasks
}

/// Runs the ingest stage over the configured snapshot directory
pub async fn run_ingest(config: &Config) -> Result<IngestSummary, HarvestError> {
    let selectors = config.selectors.compile()?;
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_seconds),
    )?;

    let snapshots: Vec<Snapshot> = load_snapshots(Path::new(&config.output.snapshot_dir))?
        .into_iter()
        .map(|(_, snapshot)| snapshot)
        .collect();

    let tree = match read_structure(Path::new(&config.output.structure_path)) {
        Ok(tree) => Some(tree),
        Err(e) => {
            tracing::warn!("Category labels fall back to slugs: {}", e);
            None
        }
    };

    let tasks = plan_tasks(&snapshots, tree.as_ref());
    tracing::info!(
        "Ingesting {} products from {} snapshots",
        tasks.len(),
        snapshots.len()
    );

    let store = Mutex::new(open_store(Path::new(&config.output.database_path))?);
    let gate = AdmissionGate::new(config.ingest.concurrency_limit as usize);
    let delay = DelayRange::new(config.ingest.delay_before_request, config.ingest.delay_before_request);

    let results = join_all(
        tasks
            .iter()
            .map(|task| ingest_one(&client, &gate, delay, &selectors, &store, task)),
    )
    .await;

    let mut summary = IngestSummary {
        snapshots: snapshots.len(),
        products_queued: tasks.len(),
        ..IngestSummary::default()
    };
    for result in results {
        match result {
            ProductResult::Stored => summary.stored += 1,
            ProductResult::NoTitle => summary.skipped_without_title += 1,
            ProductResult::FetchFailed => summary.fetch_failures += 1,
            ProductResult::StorageFailed => summary.storage_failures += 1,
        }
    }

    tracing::info!(
        "Ingest finished: {} stored, {} without title, {} fetch failures, {} storage failures",
        summary.stored,
        summary.skipped_without_title,
        summary.fetch_failures,
        summary.storage_failures
    );
    Ok(summary)
}

async fn ingest_one(
    client: &Client,
    gate: &AdmissionGate,
    delay: DelayRange,
    selectors: &CompiledSelectors,
    store: &Mutex<impl CatalogStore>,
    task: &IngestTask,
) -> ProductResult {
    let _slot = match gate.admit().await {
        Ok(slot) => slot,
        Err(e) => {
            tracing::error!("Product {} was not admitted: {}", task.url, e);
            return ProductResult::FetchFailed;
        }
    };
    polite_pause(delay).await;

    let html = match fetch_html(client, &task.url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Skipping product: {}", e);
            return ProductResult::FetchFailed;
        }
    };

    let Some(product) = extract_product(&html, &task.url, &task.category_label, selectors) else {
        tracing::debug!("No product title on {}", task.url);
        return ProductResult::NoTitle;
    };

    let stored = match store.lock() {
        Ok(mut store) => save_product(&mut *store, &product),
        Err(poisoned) => save_product(&mut *poisoned.into_inner(), &product),
    };
    match stored {
        Ok(id) => {
            tracing::debug!("Stored '{}' (id {}) from {}", product.title, id, product.url);
            ProductResult::Stored
        }
        Err(e) => {
            tracing::error!("Failed to store {}: {}", product.url, e);
            ProductResult::StorageFailed
        }
    }
}

/// Upserts the product's category type, then the product itself
pub fn save_product(store: &mut impl CatalogStore, product: &ProductRecord) -> StorageResult<i64> {
    let category_type_id = store.upsert_category_type(&product.category_label)?;
    store.upsert_product(&ProductRow {
        name: product.title.clone(),
        description: product.description_text(),
        image_url: product.image_url.as_ref().map(Url::to_string),
        source_url: product.url.to_string(),
        category_type_id,
    })
}

/// Prints an ingest summary to stdout
pub fn print_ingest_summary(summary: &IngestSummary) {
    println!("=== Ingest Summary ===\n");
    println!("Snapshots read: {}", summary.snapshots);
    println!("Distinct product URLs: {}", summary.products_queued);
    println!("  Stored: {}", summary.stored);
    println!("  Skipped (no title): {}", summary.skipped_without_title);
    println!("  Fetch failures: {}", summary.fetch_failures);
    println!("  Storage failures: {}", summary.storage_failures);
}
