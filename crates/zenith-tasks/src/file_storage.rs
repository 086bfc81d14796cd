//! File-based storage backend: one JSON document per key.
//!
//! Each storage key maps to `<data_dir>/<key>.json`. This is the default
//! backend; the documents are small enough that whole-file rewrites are the
//! atomicity unit.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::storage::{StorageBackend, StoreError, StoreResult};

/// Storage backed by per-key JSON files under a data directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open the storage directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::storage(format!(
                "Failed to create storage directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::storage(format!(
                "Failed to read key {}: {}",
                key, e
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        fs::write(self.key_path(key), value).map_err(|e| {
            StoreError::storage(format!("Failed to write key {}: {}", key, e))
        })?;
        tracing::debug!("Wrote storage key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => {
                tracing::debug!("Removed storage key: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::storage(format!(
                "Failed to remove key {}: {}",
                key, e
            ))),
        }
    }
}
