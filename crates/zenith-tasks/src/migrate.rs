//! Normalization of legacy task records on load.
//!
//! Older persisted collections predate the `priority`, `steps` and
//! `progress` fields. Loading decodes into a raw form where those fields are
//! optional; if any record lacks `steps` or `progress`, the whole collection
//! is rewritten with the gaps filled. Once normalized, repeated loads are
//! no-ops.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::storage::{StorageBackend, KEY_TASKS};
use crate::task::{Priority, Step, Task};

/// A task record as it may appear in storage, including legacy shapes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    due_date: DateTime<Utc>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    steps: Option<Vec<Step>>,
    #[serde(default)]
    progress: Option<u8>,
}

impl RawTask {
    fn is_normalized(&self) -> bool {
        self.steps.is_some() && self.progress.is_some()
    }

    fn normalize(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            is_completed: self.is_completed,
            priority: self.priority.unwrap_or_default(),
            steps: self.steps.unwrap_or_default(),
            progress: self.progress.unwrap_or(0),
        }
    }
}

/// Outcome of a load-time normalization pass.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Number of records that had missing fields filled.
    pub migrated: usize,
    /// Total number of records loaded.
    pub total: usize,
}

impl MigrationReport {
    /// Whether the collection was rewritten.
    pub fn changed(&self) -> bool {
        self.migrated > 0
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Normalized {} of {} task records",
            self.migrated, self.total
        )
    }
}

/// Load the task collection from storage, normalizing legacy records.
///
/// Missing or malformed data falls back to an empty collection with a logged
/// warning; loading never fails. When normalization changed anything, the
/// full collection is written back in one pass.
pub fn load_tasks(storage: &dyn StorageBackend) -> (Vec<Task>, MigrationReport) {
    let json = match storage.read(KEY_TASKS) {
        Ok(Some(json)) => json,
        Ok(None) => return (Vec::new(), MigrationReport::default()),
        Err(e) => {
            tracing::warn!("Failed to read stored tasks, starting empty: {}", e);
            return (Vec::new(), MigrationReport::default());
        }
    };

    let raw: Vec<RawTask> = match serde_json::from_str(&json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Stored tasks are malformed, starting empty: {}", e);
            return (Vec::new(), MigrationReport::default());
        }
    };

    let total = raw.len();
    let migrated = raw.iter().filter(|r| !r.is_normalized()).count();
    let tasks: Vec<Task> = raw.into_iter().map(RawTask::normalize).collect();
    let report = MigrationReport { migrated, total };

    if report.changed() {
        match serde_json::to_string(&tasks) {
            Ok(json) => {
                if let Err(e) = storage.write(KEY_TASKS, &json) {
                    tracing::warn!("Failed to persist normalized tasks: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize normalized tasks: {}", e),
        }
        tracing::info!("{}", report);
    }

    (tasks, report)
}
