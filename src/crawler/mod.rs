//! Crawler module for catalog harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - Category tree resolution from the catalog menu
//! - Pagination strategies and listing termination checks
//! - Admission control and politeness delays
//! - Overall crawl coordination

pub mod catalog;
mod coordinator;
mod fetcher;
pub mod listing;
pub mod pagination;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_html};
pub use listing::{extract_product_links, ListingCrawler, TerminationCheck};
pub use pagination::{PaginationStrategy, Paginator};
pub use scheduler::{polite_pause, AdmissionGate, Slot};
