//! Catalog-Harvest: a polite product catalog harvester
//!
//! This crate resolves the category tree of a single e-commerce site, walks
//! every leaf category's paginated listing to collect product URLs, and
//! persists one resumable JSON snapshot per category. A separate ingest stage
//! turns the snapshots into product rows in SQLite.

pub mod config;
pub mod crawler;
pub mod ingest;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] output::SnapshotError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// A single page fetch that did not produce a body
///
/// None of these are retried: a failed fetch is terminal for the category
/// (or product) that issued it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Transport { url, .. } | Self::Status { url, .. } => url,
        }
    }
}

/// Fatal failures while resolving the category tree
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Failed to fetch catalog root: {0}")]
    Fetch(#[from] FetchError),

    #[error("Catalog element '{selector}' not found on root page")]
    NotFound { selector: String },

    #[error("Catalog menu has no usable category links ('{selector}')")]
    Empty { selector: String },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{CategoryNode, CategoryTree, CrawlLevel, CrawlState, CrawlStatus};
