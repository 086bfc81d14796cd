//! Storage port and error types.
//!
//! This module defines the `StorageBackend` trait that abstracts over the
//! local persistence mechanisms (JSON files, SQLite key-value table).

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

/// Storage key for the session username (a JSON string, or `null`).
pub const KEY_USER: &str = "user";

/// Storage key for the task collection (a JSON array of task records).
pub const KEY_TASKS: &str = "tasks";

/// Storage key for task ids already alerted as overdue (a JSON array of
/// strings).
pub const KEY_NOTIFIED: &str = "notifiedTasks";

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Task was not found.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Validation error (e.g., blank username).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage error (filesystem, database).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value port over whichever local persistence mechanism backs the app.
///
/// Values are whole JSON documents: a write replaces the previous document
/// for that key, so a reader always sees a coherent full collection. The
/// well-known keys are [`KEY_USER`], [`KEY_TASKS`] and [`KEY_NOTIFIED`].
pub trait StorageBackend: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// Returns `None` if the key has never been written.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the document stored under `key`.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove the document stored under `key`, if any.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
