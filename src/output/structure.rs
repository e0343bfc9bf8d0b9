//! The persisted category-structure document

use crate::output::snapshot::{write_atomically, SnapshotError};
use crate::state::CategoryTree;
use std::fs;
use std::path::Path;

/// Writes the resolved tree as pretty-printed JSON
pub fn write_structure(path: &Path, tree: &CategoryTree) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(tree).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomically(path, json.as_bytes())
}

/// Reads a structure document back into a tree
pub fn read_structure(path: &Path) -> Result<CategoryTree, SnapshotError> {
    let content = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}
