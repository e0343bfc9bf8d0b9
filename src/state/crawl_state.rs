//! Per-category crawl state
//!
//! A `CrawlState` is built fresh for every listing crawl and dropped when the
//! crawl ends. It is never shared between categories or runs.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use url::Url;

/// Hex-encoded SHA-256 of a page body
pub fn fingerprint(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct CrawlState {
    current_url: Url,
    page_number: u32,
    seen: BTreeSet<String>,
    first_page_fingerprint: Option<String>,
}

impl CrawlState {
    /// Starts a crawl at page 1 of `start_url`
    pub fn new(start_url: Url) -> Self {
        Self {
            current_url: start_url,
            page_number: 1,
            seen: BTreeSet::new(),
            first_page_fingerprint: None,
        }
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Remembers the body of page 1 for the loop guard
    ///
    /// Has no effect on later pages.
    pub fn record_page_body(&mut self, body: &str) {
        if self.page_number == 1 {
            self.first_page_fingerprint = Some(fingerprint(body));
        }
    }

    /// True when `body` is byte-identical to the recorded page 1
    pub fn repeats_first_page(&self, body: &str) -> bool {
        self.first_page_fingerprint
            .as_deref()
            .is_some_and(|first| first == fingerprint(body))
    }

    /// Links from `links` not yet seen in this category, in input order
    pub fn unseen<'a>(&self, links: &'a [String]) -> Vec<&'a String> {
        links.iter().filter(|l| !self.seen.contains(*l)).collect()
    }

    /// Adds links to the seen-set, returning how many were new
    pub fn absorb<I, S>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for link in links {
            if self.seen.insert(link.into()) {
                added += 1;
            }
        }
        added
    }

    /// Moves to the next listing page
    pub fn advance(&mut self, next_url: Url) {
        self.current_url = next_url;
        self.page_number += 1;
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// The collected product URLs, sorted and duplicate-free
    pub fn into_product_urls(self) -> Vec<String> {
        self.seen.into_iter().collect()
    }
}
