//! Next-page discovery for listing pages
//!
//! Strategies are tried in order and the first one producing a URL wins:
//!
//! 1. [`NextControl`]: an explicit "next" control with an href
//! 2. [`NumberedLink`]: a numbered link labelled `current_page + 1`
//! 3. [`QueryParameter`]: the current URL with the page parameter rewritten
//!
//! The last strategy always succeeds, so it never signals the end of a
//! listing on its own. The listing crawler's termination checks do that.

use crate::config::CompiledSelectors;
use crate::url::{resolve_link, with_query_param};
use scraper::{Html, Selector};
use url::Url;

/// One independent way of finding the next listing page
pub trait PaginationStrategy: Send + Sync {
    /// Short name used in debug logs
    fn name(&self) -> &'static str;

    fn next_page(&self, document: &Html, current_url: &Url, current_page: u32) -> Option<Url>;
}

/// Follows an explicit "next" control
pub struct NextControl {
    selector: Selector,
}

impl NextControl {
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }
}

impl PaginationStrategy for NextControl {
    fn name(&self) -> &'static str {
        "next-control"
    }

    fn next_page(&self, document: &Html, current_url: &Url, _current_page: u32) -> Option<Url> {
        document
            .select(&self.selector)
            .filter_map(|control| control.value().attr("href"))
            .find_map(|href| resolve_link(href, current_url))
    }
}

/// Follows the numbered link whose label is the next page number
pub struct NumberedLink {
    selector: Selector,
}

impl NumberedLink {
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }
}

impl PaginationStrategy for NumberedLink {
    fn name(&self) -> &'static str {
        "numbered-link"
    }

    fn next_page(&self, document: &Html, current_url: &Url, current_page: u32) -> Option<Url> {
        let wanted = current_page.checked_add(1)?;
        document
            .select(&self.selector)
            .filter(|link| {
                link.text().collect::<String>().trim().parse::<u32>().ok() == Some(wanted)
            })
            .filter_map(|link| link.value().attr("href"))
            .find_map(|href| resolve_link(href, current_url))
    }
}

/// Synthesizes the next URL by rewriting the page-number query parameter
pub struct QueryParameter {
    param: String,
}

impl QueryParameter {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl PaginationStrategy for QueryParameter {
    fn name(&self) -> &'static str {
        "query-parameter"
    }

    fn next_page(&self, _document: &Html, current_url: &Url, current_page: u32) -> Option<Url> {
        let next = current_page.checked_add(1)?;
        Some(with_query_param(current_url, &self.param, &next.to_string()))
    }
}

/// Ordered list of pagination strategies
pub struct Paginator {
    strategies: Vec<Box<dyn PaginationStrategy>>,
}

impl Paginator {
    pub fn new(strategies: Vec<Box<dyn PaginationStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard fallback chain built from the configured selectors
    pub fn from_selectors(selectors: &CompiledSelectors, page_param: &str) -> Self {
        Self::new(vec![
            Box::new(NextControl::new(selectors.next_page.clone())),
            Box::new(NumberedLink::new(selectors.page_number_link.clone())),
            Box::new(QueryParameter::new(page_param)),
        ])
    }

    /// Returns the URL of the page after `current_page`, if any strategy finds one
    pub fn next_page(&self, document: &Html, current_url: &Url, current_page: u32) -> Option<Url> {
        self.strategies.iter().find_map(|strategy| {
            let next = strategy.next_page(document, current_url, current_page)?;
            tracing::trace!("Pagination via {}: {}", strategy.name(), next);
            Some(next)
        })
    }
}
