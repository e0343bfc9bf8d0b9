//! Listing crawler: walks one category's paginated listing to the end
//!
//! Each page goes through fetch, link extraction, and a decision step. The
//! decision step runs the termination checks in order and stops the crawl at
//! the first one that fires; otherwise the new links are absorbed and the
//! paginator supplies the next URL. Page N+1 is never requested before page
//! N has been decided.

use crate::config::{CompiledSelectors, CrawlerConfig, DelayRange, SiteConfig};
use crate::crawler::fetcher::fetch_html;
use crate::crawler::pagination::Paginator;
use crate::crawler::scheduler::polite_pause;
use crate::state::{CategoryOutcome, CrawlState, CrawlTarget, TerminationReason};
use crate::url::resolve_link;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// What a termination check may look at for one fetched page
#[derive(Debug)]
pub struct PageView<'a> {
    pub page_number: u32,
    /// Product links extracted from this page, de-duplicated, in page order
    pub links: &'a [String],
    pub body: &'a str,
}

/// One independent reason to stop paginating
pub trait TerminationCheck: Send + Sync {
    /// Returns a reason when the crawl must stop at this page
    ///
    /// `state` has not yet absorbed this page's links.
    fn check(&self, page: &PageView<'_>, state: &CrawlState) -> Option<TerminationReason>;
}

/// Stops on a page without any product links, including page 1
pub struct EmptyPageCheck;

impl TerminationCheck for EmptyPageCheck {
    fn check(&self, page: &PageView<'_>, _state: &CrawlState) -> Option<TerminationReason> {
        page.links
            .is_empty()
            .then_some(TerminationReason::EmptyPage)
    }
}

/// Stops when a later page adds nothing to the category's seen-set
pub struct OnlyDuplicatesCheck;

impl TerminationCheck for OnlyDuplicatesCheck {
    fn check(&self, page: &PageView<'_>, state: &CrawlState) -> Option<TerminationReason> {
        (page.page_number > 1 && state.unseen(page.links).is_empty())
            .then_some(TerminationReason::OnlyDuplicates)
    }
}

/// Stops when a later page's body is byte-identical to page 1
pub struct RepeatsFirstPageCheck;

impl TerminationCheck for RepeatsFirstPageCheck {
    fn check(&self, page: &PageView<'_>, state: &CrawlState) -> Option<TerminationReason> {
        (page.page_number > 1 && state.repeats_first_page(page.body))
            .then_some(TerminationReason::RepeatsFirstPage)
    }
}

/// The standard checks in priority order
pub fn default_checks() -> Vec<Box<dyn TerminationCheck>> {
    vec![
        Box::new(EmptyPageCheck),
        Box::new(OnlyDuplicatesCheck),
        Box::new(RepeatsFirstPageCheck),
    ]
}

/// Extracts product links from the product container of a listing page
///
/// Hrefs are resolved against the page URL; duplicates within the page are
/// dropped, keeping first-seen order.
pub fn extract_product_links(
    document: &Html,
    page_url: &Url,
    container: &Selector,
    link: &Selector,
) -> Vec<String> {
    let Some(grid) = document.select(container).next() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    grid.select(link)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Drives the pagination of one category at a time
///
/// The crawler holds configuration only. Everything that changes during a
/// crawl lives in a `CrawlState` local to `crawl_category`.
pub struct ListingCrawler {
    client: Client,
    paginator: Paginator,
    checks: Vec<Box<dyn TerminationCheck>>,
    product_container: Selector,
    product_link: Selector,
    page_delay: DelayRange,
    max_pages: u32,
}

impl ListingCrawler {
    pub fn new(
        client: Client,
        selectors: &CompiledSelectors,
        site: &SiteConfig,
        crawler: &CrawlerConfig,
    ) -> Self {
        Self {
            client,
            paginator: Paginator::from_selectors(selectors, &site.page_param),
            checks: default_checks(),
            product_container: selectors.product_container.clone(),
            product_link: selectors.product_link.clone(),
            page_delay: crawler.delay_between_pages,
            max_pages: crawler.max_pages_per_category.max(1),
        }
    }

    /// Crawls every listing page of `target` and returns what was collected
    ///
    /// Never fails: a page fetch error ends the crawl with
    /// `TerminationReason::FetchFailed` and keeps the links gathered so far.
    pub async fn crawl_category(&self, target: &CrawlTarget) -> CategoryOutcome {
        tracing::info!("Crawling category '{}' ({})", target.name, target.url);

        let mut state = CrawlState::new(target.url.clone());
        let mut pages_fetched = 0;

        loop {
            let url = state.current_url().clone();
            let page_number = state.page_number();
            tracing::debug!("Fetching page {} of '{}': {}", page_number, target.slug, url);

            let body = match fetch_html(&self.client, &url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "Page {} of '{}' failed, keeping {} links: {}",
                        page_number,
                        target.slug,
                        state.seen_count(),
                        e
                    );
                    return finish(
                        target,
                        state,
                        pages_fetched,
                        TerminationReason::FetchFailed,
                        Some(e.to_string()),
                    );
                }
            };
            pages_fetched += 1;

            // The parsed document is not Send; keep it out of the await points
            let (links, next) = {
                let document = Html::parse_document(&body);
                let links = extract_product_links(
                    &document,
                    &url,
                    &self.product_container,
                    &self.product_link,
                );
                let next = self.paginator.next_page(&document, &url, page_number);
                (links, next)
            };

            let view = PageView {
                page_number,
                links: &links,
                body: &body,
            };
            if let Some(reason) = self.checks.iter().find_map(|c| c.check(&view, &state)) {
                return finish(target, state, pages_fetched, reason, None);
            }

            state.record_page_body(&body);
            let added = state.absorb(links);
            tracing::debug!(
                "Page {} of '{}': {} new links ({} total)",
                page_number,
                target.slug,
                added,
                state.seen_count()
            );

            let next = match next {
                None => return finish(target, state, pages_fetched, TerminationReason::NoNextPage, None),
                Some(next) if next == url => {
                    return finish(
                        target,
                        state,
                        pages_fetched,
                        TerminationReason::NextPageIsCurrent,
                        None,
                    )
                }
                Some(next) => next,
            };

            if page_number >= self.max_pages {
                return finish(target, state, pages_fetched, TerminationReason::PageLimit, None);
            }

            polite_pause(self.page_delay).await;
            state.advance(next);
        }
    }
}

fn finish(
    target: &CrawlTarget,
    state: CrawlState,
    pages_fetched: u32,
    reason: TerminationReason,
    error: Option<String>,
) -> CategoryOutcome {
    let outcome = CategoryOutcome {
        target: target.clone(),
        product_urls: state.into_product_urls(),
        pages_fetched,
        reason,
        error,
    };
    tracing::info!(
        "Finished '{}': {} product URLs over {} pages ({})",
        target.slug,
        outcome.product_urls.len(),
        pages_fetched,
        reason
    );
    outcome
}
