//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[site]` is optional and falls back to defaults tuned
//! for the catalog markup the harvester was written against.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling at most {} categories at once", config.crawler.concurrency_limit);
//! ```

mod parser;
mod selectors;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DelayRange, IngestConfig, OutputConfig, SelectorConfig, SiteConfig,
    UserAgentConfig,
};

pub use selectors::{compile_selector, CompiledSelectors};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
