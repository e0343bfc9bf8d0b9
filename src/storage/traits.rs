//! Storage traits and error types
//!
//! This module defines the trait interface for catalog storage backends and
//! associated error types.

use crate::storage::ProductRow;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog storage backends
pub trait CatalogStore {
    // ===== Category Types =====

    /// Inserts a category type if absent and returns its ID
    fn upsert_category_type(&mut self, name: &str) -> StorageResult<i64>;

    fn count_category_types(&self) -> StorageResult<u64>;

    // ===== Products =====

    /// Inserts or updates a product keyed by name
    ///
    /// An existing product keeps its ID; description, image, source URL and
    /// category are overwritten.
    fn upsert_product(&mut self, product: &ProductRow) -> StorageResult<i64>;

    fn get_product(&self, name: &str) -> StorageResult<Option<ProductRow>>;

    fn count_products(&self) -> StorageResult<u64>;
}
