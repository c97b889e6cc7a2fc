//! Local persistence for result records, runs, and artifacts.
//!
//! Everything lives under a single storage root:
//!
//! ```text
//! <root>/
//!   records.sqlite            # Key-value records and run summaries
//!   objects/<sha256>/<name>   # Artifacts, keyed by the hash of their source id
//! ```

mod objects;
mod records;
mod runs;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;

pub use objects::content_key;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    ObjectNotFound(PathBuf),

    #[error("run not found: {0}")]
    RunNotFound(uuid::Uuid),

    #[error("invalid object name: {0:?}")]
    InvalidObjectName(String),

    #[error("corrupt storage: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        seq       INTEGER PRIMARY KEY AUTOINCREMENT,
        key       TEXT NOT NULL UNIQUE,
        run_id    TEXT NOT NULL,
        record    TEXT NOT NULL,
        stored_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS runs (
        id         TEXT PRIMARY KEY,
        started_at TEXT NOT NULL,
        finished_at TEXT,
        items      INTEGER NOT NULL,
        batches    INTEGER NOT NULL,
        present    INTEGER NOT NULL,
        absent     INTEGER NOT NULL
    );
";

/// Record store and object store sharing one root directory.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory and the database schema are created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self { root };
        storage.open_db()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.fanout/store/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fanout").join("store"))
    }

    fn open_db(&self) -> Result<Connection> {
        Ok(Connection::open(self.root.join("records.sqlite"))?)
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn new_creates_root_and_database() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("store");

        Storage::new(&root).unwrap();

        assert!(root.join("records.sqlite").is_file());
    }

    #[test]
    fn reopening_keeps_schema() {
        let dir = TempDir::new().unwrap();
        Storage::new(dir.path()).unwrap();
        Storage::new(dir.path()).unwrap();
    }
}
