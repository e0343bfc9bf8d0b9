//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the product database
//! filled by the ingest stage.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Human category labels products are filed under
CREATE TABLE IF NOT EXISTS category_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- One row per product, keyed by its display name
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    image_url TEXT,
    source_url TEXT NOT NULL,
    category_type_id INTEGER NOT NULL REFERENCES category_types(id),
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_type_id);
CREATE INDEX IF NOT EXISTS idx_products_source_url ON products(source_url);
"#;

/// Creates any missing tables and indexes; existing rows are left alone
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
