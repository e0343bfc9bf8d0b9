//! State module for the harvest data model
//!
//! # Components
//!
//! - `CategoryTree` / `CategoryNode`: the resolved catalog menu
//! - `CrawlState`: mutable state of one category's listing crawl
//! - `CategoryOutcome`: how a category crawl ended and what it collected

mod category;
mod crawl_state;
mod outcome;

// Re-export main types
pub use category::{CategoryNode, CategoryTree, CrawlLevel, CrawlTarget};
pub use crawl_state::{fingerprint, CrawlState};
pub use outcome::{CategoryOutcome, CrawlStatus, TerminationReason};
