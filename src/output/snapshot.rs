//! Per-category JSON snapshots
//!
//! One file per crawled category, `<dir>/<slug>.json`, written through a
//! temporary sibling and a rename. Snapshots are independent: a run killed
//! midway leaves a valid subset that the next run resumes from.

use crate::state::CategoryOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the failed-category log inside the snapshot directory
pub const FAILED_LOG_NAME: &str = "failed_categories.log";

/// Snapshot read/write failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The persisted result of one category crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub category_url: String,
    pub category_name_slug: String,
    /// Absolute product URLs, sorted and duplicate-free
    pub product_urls: Vec<String>,
}

impl Snapshot {
    pub fn new(
        category_url: impl Into<String>,
        category_name_slug: impl Into<String>,
        product_urls: impl IntoIterator<Item = String>,
    ) -> Self {
        let product_urls: BTreeSet<String> = product_urls.into_iter().collect();
        Self {
            category_url: category_url.into(),
            category_name_slug: category_name_slug.into(),
            product_urls: product_urls.into_iter().collect(),
        }
    }

    pub fn from_outcome(outcome: &CategoryOutcome) -> Self {
        Self::new(
            outcome.target.url.as_str(),
            outcome.target.slug.as_str(),
            outcome.product_urls.iter().cloned(),
        )
    }
}

/// Destination for finished category snapshots
pub trait SnapshotSink {
    /// Persists one snapshot, returning where it was written
    fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError>;

    /// Reads back the snapshot for `slug`, if one exists
    fn read(&self, slug: &str) -> Result<Option<Snapshot>, SnapshotError>;
}

/// Writes pretty-printed JSON snapshots into one directory
#[derive(Debug, Clone)]
pub struct JsonSnapshotSink {
    dir: PathBuf,
}

impl JsonSnapshotSink {
    /// Opens (creating if needed) the snapshot directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SnapshotError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug))
    }

    /// Removes every snapshot and the failed-category log
    pub fn clear(&self) -> Result<usize, SnapshotError> {
        let mut removed = 0;
        for path in snapshot_paths(&self.dir)? {
            fs::remove_file(&path).map_err(|e| SnapshotError::io(&path, e))?;
            removed += 1;
        }
        write_failed_log(&self.dir, &[])?;
        Ok(removed)
    }
}

impl SnapshotSink for JsonSnapshotSink {
    fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(&snapshot.category_name_slug);
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| SnapshotError::json(&path, e))?;
        write_atomically(&path, json.as_bytes())?;
        Ok(path)
    }

    fn read(&self, slug: &str) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path_for(slug);
        if !path.exists() {
            return Ok(None);
        }
        read_snapshot(&path).map(Some)
    }
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into place
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, bytes).map_err(|e| SnapshotError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| SnapshotError::io(path, e))
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let content = fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| SnapshotError::json(path, e))
}

/// `*.json` files in `dir`, sorted by file name
fn snapshot_paths(dir: &Path) -> Result<Vec<PathBuf>, SnapshotError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SnapshotError::io(dir, e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SnapshotError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads every snapshot in `dir`, in file-name order
///
/// Unreadable or malformed files are logged and skipped.
pub fn load_snapshots(dir: &Path) -> Result<Vec<(PathBuf, Snapshot)>, SnapshotError> {
    let mut snapshots = Vec::new();
    for path in snapshot_paths(dir)? {
        match read_snapshot(&path) {
            Ok(snapshot) => snapshots.push((path, snapshot)),
            Err(e) => tracing::warn!("Skipping snapshot: {}", e),
        }
    }
    Ok(snapshots)
}

/// Records the URLs of categories that ended in a fetch failure
///
/// An empty list removes the log.
pub fn write_failed_log(dir: &Path, urls: &[String]) -> Result<(), SnapshotError> {
    let path = dir.join(FAILED_LOG_NAME);
    if urls.is_empty() {
        return match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(SnapshotError::io(&path, e)),
            _ => Ok(()),
        };
    }

    let sorted: BTreeSet<&str> = urls.iter().map(String::as_str).collect();
    let mut content = sorted.into_iter().collect::<Vec<_>>().join("\n");
    content.push('\n');
    write_atomically(&path, content.as_bytes())
}

/// Category URLs listed in the failed-category log; empty when absent
pub fn read_failed_log(dir: &Path) -> Result<BTreeSet<String>, SnapshotError> {
    let path = dir.join(FAILED_LOG_NAME);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(e) => Err(SnapshotError::io(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        Snapshot::new(
            "https://shop.example.com/catalog/optics/",
            "optics",
            vec![
                "https://shop.example.com/p/b/".to_string(),
                "https://shop.example.com/p/a/".to_string(),
                "https://shop.example.com/p/b/".to_string(),
            ],
        )
    }

    #[test]
    fn test_snapshot_sorted_and_deduplicated() {
        assert_eq!(
            sample().product_urls,
            vec!["https://shop.example.com/p/a/", "https://shop.example.com/p/b/"]
        );
    }

    #[test]
    fn test_snapshot_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["category_url"], "https://shop.example.com/catalog/optics/");
        assert_eq!(json["category_name_slug"], "optics");
        assert_eq!(json["product_urls"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSnapshotSink::new(dir.path().join("snapshots")).unwrap();

        let path = sink.write(&sample()).unwrap();
        assert_eq!(path, dir.path().join("snapshots").join("optics.json"));
        assert_eq!(sink.read("optics").unwrap(), Some(sample()));
        assert_eq!(sink.read("missing").unwrap(), None);

        let leftovers: Vec<_> = fs::read_dir(sink.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["optics.json"]);
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSnapshotSink::new(dir.path()).unwrap();
        fs::write(sink.path_for("broken"), "{ not json").unwrap();
        assert!(matches!(sink.read("broken"), Err(SnapshotError::Json { .. })));
    }

    #[test]
    fn test_load_snapshots_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSnapshotSink::new(dir.path()).unwrap();
        sink.write(&sample()).unwrap();
        sink.write(&Snapshot::new("https://shop.example.com/catalog/gels/", "gels", Vec::new()))
            .unwrap();
        fs::write(dir.path().join("zz.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load_snapshots(dir.path()).unwrap();
        let slugs: Vec<&str> = loaded.iter().map(|(_, s)| s.category_name_slug.as_str()).collect();
        assert_eq!(slugs, vec!["gels", "optics"]);
    }

    #[test]
    fn test_load_snapshots_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(load_snapshots(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_failed_log_round_trip_and_removal() {
        let dir = TempDir::new().unwrap();
        write_failed_log(
            dir.path(),
            &["https://s/b/".to_string(), "https://s/a/".to_string()],
        )
        .unwrap();

        let content = fs::read_to_string(dir.path().join(FAILED_LOG_NAME)).unwrap();
        assert_eq!(content, "https://s/a/\nhttps://s/b/\n");
        assert_eq!(read_failed_log(dir.path()).unwrap().len(), 2);

        write_failed_log(dir.path(), &[]).unwrap();
        assert!(!dir.path().join(FAILED_LOG_NAME).exists());
        assert!(read_failed_log(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_snapshots() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSnapshotSink::new(dir.path()).unwrap();
        sink.write(&sample()).unwrap();
        write_failed_log(dir.path(), &["https://s/a/".to_string()]).unwrap();

        assert_eq!(sink.clear().unwrap(), 1);
        assert!(load_snapshots(dir.path()).unwrap().is_empty());
        assert!(read_failed_log(dir.path()).unwrap().is_empty());
    }
}
