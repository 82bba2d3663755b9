//! Snapshot Store
//!
//! Holds the one current quote snapshot and mirrors it to a JSON file so the
//! last good quote survives restarts.
//!
//! Readers get a copy of the in-memory snapshot and never wait on disk I/O.
//! `accept` swaps the in-memory value first and then writes the file through
//! a temp-file rename; a failed write is logged and the new value stays live.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

use super::quote::{Provenance, QuoteSnapshot};

/// Default snapshot file name
pub const DEFAULT_STORE_FILE: &str = "database.json";

#[derive(Error, Debug, Clone)]
pub enum PersistError {
    #[error("Failed to serialize snapshot: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize snapshot: {0}")]
    DeserializationError(String),

    #[error("Failed to write snapshot file: {0}")]
    WriteError(String),

    #[error("Failed to read snapshot file: {0}")]
    ReadError(String),

    #[error("Snapshot file is corrupted: {0}")]
    CorruptedFile(String),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

/// Candidate carried no positive price and was not stored
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Rejected snapshot without a positive price (tola={per_tola}, 10g={per_ten_gram})")]
pub struct RejectedSnapshot {
    pub per_tola: f64,
    pub per_ten_gram: f64,
}

/// On-disk record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSnapshot {
    per_tola: f64,
    per_ten_gram: f64,
    provenance: Provenance,
    observed_at: chrono::DateTime<chrono::Utc>,
}

impl From<&QuoteSnapshot> for PersistedSnapshot {
    fn from(snapshot: &QuoteSnapshot) -> Self {
        Self {
            per_tola: snapshot.per_tola,
            per_ten_gram: snapshot.per_ten_gram,
            provenance: snapshot.provenance,
            observed_at: snapshot.observed_at,
        }
    }
}

impl From<PersistedSnapshot> for QuoteSnapshot {
    fn from(record: PersistedSnapshot) -> Self {
        Self {
            per_tola: record.per_tola,
            per_ten_gram: record.per_ten_gram,
            provenance: record.provenance,
            observed_at: record.observed_at,
        }
    }
}

/// Result of reading the snapshot file at startup
#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// No file, or an empty one
    Empty,
    /// Prior snapshot restored
    Restored(QuoteSnapshot),
    /// File unreadable or invalid; the store starts uninitialized
    Corrupted(String),
}

/// Write a snapshot to `path` atomically (temp file + rename)
pub fn save_snapshot(path: &Path, snapshot: &QuoteSnapshot) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| PersistError::DirectoryError(e.to_string()))?;
        }
    }

    let content = serde_json::to_string_pretty(&PersistedSnapshot::from(snapshot))
        .map_err(|e| PersistError::SerializationError(e.to_string()))?;

    let tmp_path = temp_path(path);
    fs::write(&tmp_path, content)
        .map_err(|e| PersistError::WriteError(e.to_string()))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PersistError::WriteError(e.to_string()));
    }

    Ok(())
}

/// Read a snapshot from `path`; `Ok(None)` when there is nothing to read
pub fn load_snapshot(path: &Path) -> Result<Option<QuoteSnapshot>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| PersistError::ReadError(e.to_string()))?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let record: PersistedSnapshot = serde_json::from_str(&content)
        .map_err(|e| PersistError::DeserializationError(e.to_string()))?;

    Ok(Some(record.into()))
}

/// Load and validate the snapshot file
pub fn try_restore(path: &Path) -> LoadStatus {
    match load_snapshot(path) {
        Ok(Some(snapshot)) => {
            if !snapshot.per_tola.is_finite() || !snapshot.per_ten_gram.is_finite() {
                return LoadStatus::Corrupted("Non-finite price".to_string());
            }
            if snapshot.per_tola < 0.0 || snapshot.per_ten_gram < 0.0 {
                return LoadStatus::Corrupted("Negative price".to_string());
            }
            if snapshot.provenance.is_live() && !snapshot.has_price() {
                return LoadStatus::Corrupted("Live snapshot without a price".to_string());
            }
            LoadStatus::Restored(snapshot)
        }
        Ok(None) => LoadStatus::Empty,
        Err(e) => LoadStatus::Corrupted(e.to_string()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_STORE_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Current-snapshot store
#[derive(Debug)]
pub struct SnapshotStore {
    path: Option<PathBuf>,
    current: RwLock<QuoteSnapshot>,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Open a file-backed store, restoring the prior snapshot if there is one
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let initial = match try_restore(&path) {
            LoadStatus::Restored(snapshot) => {
                tracing::info!(
                    "Snapshot restored from {}: tola={:.2} 10g={:.2} ({:?}, {})",
                    path.display(),
                    snapshot.per_tola,
                    snapshot.per_ten_gram,
                    snapshot.provenance,
                    snapshot.observed_at.to_rfc3339()
                );
                snapshot
            }
            LoadStatus::Empty => {
                tracing::info!("No prior snapshot at {}, starting uninitialized", path.display());
                QuoteSnapshot::uninitialized()
            }
            LoadStatus::Corrupted(reason) => {
                tracing::error!(
                    "Ignoring unreadable snapshot file {}: {}",
                    path.display(),
                    reason
                );
                QuoteSnapshot::uninitialized()
            }
        };

        Self {
            path: Some(path),
            current: RwLock::new(initial),
            write_lock: Mutex::new(()),
        }
    }

    /// Memory-only store, nothing is written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(QuoteSnapshot::uninitialized()),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot file path, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Last accepted snapshot (or the startup value)
    pub fn current(&self) -> QuoteSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stamp, publish and persist a candidate snapshot
    pub fn accept(&self, candidate: QuoteSnapshot) -> Result<QuoteSnapshot, RejectedSnapshot> {
        if !candidate.has_price() {
            tracing::warn!(
                "Rejecting snapshot without price: tola={} 10g={}",
                candidate.per_tola,
                candidate.per_ten_gram
            );
            return Err(RejectedSnapshot {
                per_tola: candidate.per_tola,
                per_ten_gram: candidate.per_ten_gram,
            });
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = QuoteSnapshot {
            observed_at: chrono::Utc::now(),
            ..candidate
        };

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();

        if let Some(path) = &self.path {
            match save_snapshot(path, &snapshot) {
                Ok(()) => tracing::debug!("Snapshot written to {}", path.display()),
                Err(e) => tracing::error!("Snapshot kept in memory only: {}", e),
            }
        }

        tracing::info!(
            "Cache updated: tola={:.2} 10g={:.2}",
            snapshot.per_tola,
            snapshot.per_ten_gram
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn live(per_tola: f64, per_ten_gram: f64) -> QuoteSnapshot {
        QuoteSnapshot::live(per_tola, per_ten_gram)
    }

    #[test]
    fn test_open_missing_file_is_uninitialized() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("database.json"));

        let current = store.current();
        assert_eq!(current.provenance, Provenance::Uninitialized);
        assert_eq!(current.per_tola, 0.0);
        assert_eq!(current.per_ten_gram, 0.0);
    }

    #[test]
    fn test_accept_then_current() {
        let store = SnapshotStore::in_memory();
        let before = chrono::Utc::now();

        let accepted = store.accept(live(150_000.0, 12_859.5)).unwrap();
        let current = store.current();

        assert_eq!(current, accepted);
        assert_eq!(current.per_tola, 150_000.0);
        assert_eq!(current.per_ten_gram, 12_859.5);
        assert_eq!(current.provenance, Provenance::Live);
        assert!(current.observed_at >= before);
    }

    #[test]
    fn test_accept_rejects_zero_prices() {
        let store = SnapshotStore::in_memory();
        store.accept(live(100.0, 85.0)).unwrap();

        let result = store.accept(live(0.0, 0.0));
        assert!(result.is_err());
        assert_eq!(store.current().per_tola, 100.0);
    }

    #[test]
    fn test_restart_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.json");

        let accepted = {
            let store = SnapshotStore::open(&path);
            store.accept(live(150_000.0, 12_859.5)).unwrap()
        };

        let reopened = SnapshotStore::open(&path);
        let current = reopened.current();
        assert_eq!(current.per_tola, 150_000.0);
        assert_eq!(current.per_ten_gram, 12_859.5);
        assert_eq!(current.provenance, Provenance::Live);
        assert_eq!(current.observed_at, accepted.observed_at);
    }

    #[test]
    fn test_accept_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.json");
        let store = SnapshotStore::open(&path);

        store.accept(live(100.0, 85.0)).unwrap();
        store.accept(live(200.0, 171.0)).unwrap();

        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded.per_tola, 200.0);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_corrupted_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(&path, "{ invalid json }").unwrap();

        assert!(matches!(try_restore(&path), LoadStatus::Corrupted(_)));

        let store = SnapshotStore::open(&path);
        assert_eq!(store.current().provenance, Provenance::Uninitialized);
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(&path, "  \n").unwrap();

        assert!(matches!(try_restore(&path), LoadStatus::Empty));
    }

    #[test]
    fn test_invalid_values_are_corrupted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.json");

        save_snapshot(&path, &live(-5.0, 10.0)).unwrap();
        assert!(matches!(try_restore(&path), LoadStatus::Corrupted(_)));

        save_snapshot(&path, &live(0.0, 0.0)).unwrap();
        assert!(matches!(try_restore(&path), LoadStatus::Corrupted(_)));

        save_snapshot(&path, &QuoteSnapshot::uninitialized()).unwrap();
        assert!(matches!(try_restore(&path), LoadStatus::Restored(_)));
    }

    #[test]
    fn test_write_failure_keeps_memory_snapshot() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("database.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let store = SnapshotStore::open(&path);
        let accepted = store.accept(live(150_000.0, 12_859.5));

        assert!(accepted.is_ok());
        assert_eq!(store.current().per_tola, 150_000.0);
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("database.json");

        save_snapshot(&path, &live(1.0, 1.0)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_temp_path() {
        let path = Path::new("/var/lib/silver/database.json");
        assert_eq!(temp_path(path), Path::new("/var/lib/silver/database.json.tmp"));
    }
}
