//! SQLite-based storage backend.
//!
//! A single `kv(key, value)` table holding the same JSON documents the file
//! backend keeps in per-key files. The connection sits behind a mutex so the
//! backend can be shared between the store and the reminder scanner.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::{StorageBackend, StoreError, StoreResult};

/// Storage backed by a single-table SQLite database.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open the database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::storage(format!("Failed to open database: {}", e)))?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::storage(format!("Failed to open database: {}", e)))?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| StoreError::storage(format!("Failed to create schema: {}", e)))
    }
}

impl StorageBackend for SqliteStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::storage(e.to_string()))
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                r#"
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                params![key, value],
            )
            .map_err(|e| StoreError::storage(e.to_string()))?;
        tracing::debug!("Wrote storage key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| StoreError::storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::storage::{KEY_NOTIFIED, KEY_TASKS};

    #[test]
    fn test_sqlite_storage_roundtrip() {
        let storage = SqliteStorage::in_memory().unwrap();

        assert!(storage.read(KEY_TASKS).unwrap().is_none());

        storage.write(KEY_TASKS, "[]").unwrap();
        assert_eq!(storage.read(KEY_TASKS).unwrap().as_deref(), Some("[]"));

        storage.write(KEY_TASKS, "[1]").unwrap();
        assert_eq!(storage.read(KEY_TASKS).unwrap().as_deref(), Some("[1]"));

        storage.remove(KEY_TASKS).unwrap();
        assert!(storage.read(KEY_TASKS).unwrap().is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.write(KEY_TASKS, "[]").unwrap();
        storage.write(KEY_NOTIFIED, "[\"t1\"]").unwrap();

        storage.remove(KEY_TASKS).unwrap();
        assert!(storage.read(KEY_TASKS).unwrap().is_none());
        assert_eq!(
            storage.read(KEY_NOTIFIED).unwrap().as_deref(),
            Some("[\"t1\"]")
        );
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(storage.remove("nothing").is_ok());
    }
}
