//! Output module for crawl results
//!
//! This module handles:
//! - Writing per-category JSON snapshots and the failed-category log
//! - Persisting the resolved category structure
//! - Run summaries and snapshot statistics

mod snapshot;
pub mod stats;
mod structure;

pub use snapshot::{
    load_snapshots, read_failed_log, read_snapshot, write_atomically, write_failed_log,
    JsonSnapshotSink, Snapshot, SnapshotError, SnapshotSink, FAILED_LOG_NAME,
};
pub use stats::{print_statistics, print_summary, RunSummary, SnapshotStatistics};
pub use structure::{read_structure, write_structure};
