//! Storage module for persisting harvested products
//!
//! This module handles all database operations for the ingest stage:
//! - SQLite database initialization and schema management
//! - Category type and product upserts

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCatalogStore;
pub use traits::{CatalogStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the catalog database at `path`
pub fn open_store(path: &Path) -> StorageResult<SqliteCatalogStore> {
    SqliteCatalogStore::new(path)
}

/// A product as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    /// Sections rendered as `"<title>:\n<text>"`, joined by blank lines
    pub description: String,
    pub image_url: Option<String>,
    pub source_url: String,
    pub category_type_id: i64,
}
