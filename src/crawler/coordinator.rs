//! Crawler coordinator - main harvest orchestration logic
//!
//! This module ties the crawl together:
//! - Resolving and persisting the category structure
//! - Selecting crawl targets and skipping the ones a previous run finished
//! - Fanning out one listing crawl per category behind the admission gate
//! - Writing snapshots, the failed-category log, and the run summary

use crate::config::{CompiledSelectors, Config};
use crate::crawler::catalog;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::listing::ListingCrawler;
use crate::crawler::scheduler::{polite_pause, AdmissionGate};
use crate::output::{
    read_failed_log, write_failed_log, write_structure, JsonSnapshotSink, RunSummary, Snapshot,
    SnapshotSink,
};
use crate::state::{CategoryOutcome, CrawlTarget};
use crate::HarvestError;
use futures::future::join_all;
use reqwest::Client;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// What one admitted category task produced
struct TaskResult {
    outcome: CategoryOutcome,
    written: bool,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    selectors: CompiledSelectors,
    client: Client,
    sink: JsonSnapshotSink,
    root_url: Url,
    fresh: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `fresh` - Recrawl every category instead of resuming from snapshots
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let selectors = config.selectors.compile()?;
        let root_url = Url::parse(&config.site.root_url)?;
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_seconds),
        )?;
        let sink = JsonSnapshotSink::new(&config.output.snapshot_dir)?;

        Ok(Self {
            config,
            selectors,
            client,
            sink,
            root_url,
            fresh,
        })
    }

    /// Runs the harvest to completion
    ///
    /// Only structure resolution and local I/O on the structure file are
    /// fatal. Category failures are counted in the summary.
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        let tree = catalog::resolve(&self.client, &self.root_url, &self.selectors).await?;
        write_structure(Path::new(&self.config.output.structure_path), &tree)?;
        tracing::info!("Category structure saved to {}", self.config.output.structure_path);

        let targets = tree.crawl_targets(self.config.crawler.crawl_level);
        warn_on_slug_collisions(&targets);

        let mut summary = RunSummary::default();
        let pending = if self.fresh {
            let removed = self.sink.clear()?;
            if removed > 0 {
                tracing::info!("Fresh run: removed {} existing snapshots", removed);
            }
            targets
        } else {
            let (pending, resumed) = self.partition_resumable(targets)?;
            summary.resumed = resumed;
            pending
        };

        tracing::info!(
            "{} categories to crawl ({} resumed), at most {} at a time",
            pending.len(),
            summary.resumed,
            self.config.crawler.concurrency_limit
        );

        let crawler = ListingCrawler::new(
            self.client.clone(),
            &self.selectors,
            &self.config.site,
            &self.config.crawler,
        );
        let gate = AdmissionGate::new(self.config.crawler.concurrency_limit as usize);

        let tasks = pending
            .iter()
            .map(|target| self.crawl_one(&crawler, &gate, &self.sink, target));
        let results = join_all(tasks).await;

        for result in results.into_iter().flatten() {
            summary.record(&result.outcome);
            if !result.written {
                summary.write_failures += 1;
            }
        }
        summary.peak_in_flight = gate.peak();

        write_failed_log(self.sink.dir(), &summary.failed_urls)?;

        tracing::info!(
            "Harvest finished: {} complete, {} empty, {} failed, {} resumed",
            summary.complete,
            summary.empty,
            summary.failed_partial,
            summary.resumed
        );
        Ok(summary)
    }

    /// Splits targets into those still to crawl and a count of resumed ones
    ///
    /// A target resumes when its snapshot parses, belongs to the same
    /// category URL, and the URL is not in the previous failed-category log.
    fn partition_resumable(
        &self,
        targets: Vec<CrawlTarget>,
    ) -> Result<(Vec<CrawlTarget>, usize), HarvestError> {
        let previously_failed = read_failed_log(self.sink.dir())?;
        let mut pending = Vec::with_capacity(targets.len());
        let mut resumed = 0;

        for target in targets {
            if self.is_finished(&target, &previously_failed) {
                tracing::debug!("Resuming '{}' from existing snapshot", target.slug);
                resumed += 1;
            } else {
                pending.push(target);
            }
        }

        Ok((pending, resumed))
    }

    fn is_finished(&self, target: &CrawlTarget, previously_failed: &BTreeSet<String>) -> bool {
        if previously_failed.contains(target.url.as_str()) {
            return false;
        }
        match self.sink.read(&target.slug) {
            Ok(Some(snapshot)) => snapshot.category_url == target.url.as_str(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Recrawling '{}': {}", target.slug, e);
                false
            }
        }
    }

    /// Crawls one category while holding an admission slot
    ///
    /// The slot is held through the inter-category pause and released when
    /// it drops, on every path out of this function.
    async fn crawl_one(
        &self,
        crawler: &ListingCrawler,
        gate: &AdmissionGate,
        sink: &dyn SnapshotSink,
        target: &CrawlTarget,
    ) -> Option<TaskResult> {
        let _slot = match gate.admit().await {
            Ok(slot) => slot,
            Err(e) => {
                tracing::error!("Category '{}' was not admitted: {}", target.slug, e);
                return None;
            }
        };
        tracing::trace!("Admitted '{}' ({} in flight)", target.slug, gate.held());

        let outcome = crawler.crawl_category(target).await;

        let written = match sink.write(&Snapshot::from_outcome(&outcome)) {
            Ok(path) => {
                tracing::debug!("Snapshot for '{}' written to {}", target.slug, path.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to write snapshot for '{}': {}", target.slug, e);
                false
            }
        };

        polite_pause(self.config.crawler.delay_between_categories).await;
        Some(TaskResult { outcome, written })
    }
}

/// Logs every slug shared by more than one target; the later snapshot wins
fn warn_on_slug_collisions(targets: &[CrawlTarget]) {
    let mut by_slug: HashMap<&str, Vec<&str>> = HashMap::new();
    for target in targets {
        by_slug
            .entry(target.slug.as_str())
            .or_default()
            .push(target.url.as_str());
    }

    for (slug, urls) in by_slug.into_iter().filter(|(_, urls)| urls.len() > 1) {
        tracing::warn!(
            "Slug '{}' is shared by {} categories ({}); the last snapshot written wins",
            slug,
            urls.len(),
            urls.join(", ")
        );
    }
}

/// Runs a complete harvest with the given configuration
pub async fn run_crawl(config: Config, fresh: bool) -> Result<RunSummary, HarvestError> {
    let coordinator = Coordinator::new(config, fresh)?;
    coordinator.run().await
}
