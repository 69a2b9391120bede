use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use gigwatch_core::Listing;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filesystem-backed listing history.
///
/// The snapshot is one JSON array, newest listings first, capped by the
/// caller. Writes go to a `.tmp` sibling and are renamed into place, so an
/// interrupted write leaves the previous snapshot intact.
pub struct ListingStore {
    path: PathBuf,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot.
    ///
    /// A missing file is a normal first run, and unreadable or malformed
    /// content is recoverable; both yield an empty history rather than an
    /// error, so one bad file never wedges the watcher.
    pub fn load(&self) -> Vec<Listing> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no listing snapshot yet, starting empty");
                return Vec::new();
            }
            Err(e) => {
                info!(path = %self.path.display(), error = %e, "failed to read listing snapshot, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&json) {
            Ok(listings) => listings,
            Err(e) => {
                info!(path = %self.path.display(), error = %e, "listing snapshot is not valid JSON, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the snapshot, replacing the previous file atomically.
    pub fn save(&self, snapshot: &[Listing]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Listings from `fetched` whose id does not appear in `existing`,
/// in fetch order.
pub fn compute_new(fetched: &[Listing], existing: &[Listing]) -> Vec<Listing> {
    fetched
        .iter()
        .filter(|listing| !existing.iter().any(|seen| seen.id == listing.id))
        .cloned()
        .collect()
}

/// Prepend `fresh` to `existing` and cap the result, dropping the oldest
/// entries past `cap`.
pub fn merge(fresh: &[Listing], existing: &[Listing], cap: usize) -> Vec<Listing> {
    fresh.iter().chain(existing.iter()).take(cap).cloned().collect()
}
