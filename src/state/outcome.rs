use crate::state::CrawlTarget;
use std::fmt;

/// Why a listing crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    // ===== Decided on page content =====
    /// The page carried no product links at all
    EmptyPage,

    /// Every link on a later page had already been seen
    OnlyDuplicates,

    /// A later page was byte-identical to page 1
    RepeatsFirstPage,

    // ===== Decided by pagination =====
    /// No pagination strategy produced a next URL
    NoNextPage,

    /// The next URL equals the current one
    NextPageIsCurrent,

    /// `max-pages-per-category` was reached
    PageLimit,

    // ===== Abnormal =====
    /// A page fetch failed; links gathered so far are kept
    FetchFailed,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPage => "empty_page",
            Self::OnlyDuplicates => "only_duplicates",
            Self::RepeatsFirstPage => "repeats_first_page",
            Self::NoNextPage => "no_next_page",
            Self::NextPageIsCurrent => "next_page_is_current",
            Self::PageLimit => "page_limit",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final classification of one category crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStatus {
    /// Pagination ran to its end and produced links
    Complete,

    /// Pagination ran to its end without a single link
    Empty,

    /// A fetch failed mid-crawl; the snapshot holds what was gathered
    FailedPartial,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Empty => "empty",
            Self::FailedPartial => "failed_partial",
        }
    }
}

/// Result of crawling one category
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub target: CrawlTarget,

    /// Sorted, duplicate-free product URLs
    pub product_urls: Vec<String>,

    /// Listing pages successfully fetched
    pub pages_fetched: u32,

    pub reason: TerminationReason,

    /// Description of the failure behind `FetchFailed`
    pub error: Option<String>,
}

impl CategoryOutcome {
    pub fn status(&self) -> CrawlStatus {
        if self.reason == TerminationReason::FetchFailed {
            CrawlStatus::FailedPartial
        } else if self.product_urls.is_empty() {
            CrawlStatus::Empty
        } else {
            CrawlStatus::Complete
        }
    }
}
