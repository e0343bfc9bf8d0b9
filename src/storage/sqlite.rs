//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CatalogStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStore, StorageError, StorageResult};
use crate::storage::ProductRow;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite catalog store
pub struct SqliteCatalogStore {
    conn: Connection,
}

impl SqliteCatalogStore {
    /// Opens (creating if needed) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CatalogStore for SqliteCatalogStore {
    // ===== Category Types =====

    fn upsert_category_type(&mut self, name: &str) -> StorageResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::ConstraintViolation(
                "category type name is empty".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO category_types (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM category_types WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn count_category_types(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM category_types", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Products =====

    fn upsert_product(&mut self, product: &ProductRow) -> StorageResult<i64> {
        if product.name.trim().is_empty() {
            return Err(StorageError::ConstraintViolation(
                "product name is empty".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO products (name, description, image_url, source_url, category_type_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                image_url = excluded.image_url,
                source_url = excluded.source_url,
                category_type_id = excluded.category_type_id,
                updated_at = excluded.updated_at
             RETURNING id",
            params![
                product.name,
                product.description,
                product.image_url,
                product.source_url,
                product.category_type_id,
                now
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_product(&self, name: &str) -> StorageResult<Option<ProductRow>> {
        let product = self
            .conn
            .query_row(
                "SELECT name, description, image_url, source_url, category_type_id
                 FROM products WHERE name = ?1",
                params![name],
                |row| {
                    Ok(ProductRow {
                        name: row.get(0)?,
                        description: row.get(1)?,
                        image_url: row.get(2)?,
                        source_url: row.get(3)?,
                        category_type_id: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(product)
    }

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
