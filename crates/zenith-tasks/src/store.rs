//! The task store: the owned task collection plus the user session,
//! persisted through an injected storage backend.
//!
//! Every mutation applies in memory first and then writes the full
//! collection back. A failed write is logged and the in-memory effect
//! stands; the change is lost on the next load. That mirrors the persistence
//! contract of the storage layout and is a documented limitation, not an
//! error surfaced to callers.

use std::sync::Arc;

use uuid::Uuid;

use crate::migrate;
use crate::storage::{StorageBackend, StoreError, StoreResult, KEY_TASKS, KEY_USER};
use crate::task::{progress_from_steps, Task, TaskDraft, TaskPatch};

/// Store for the task collection and the current session.
pub struct TaskStore {
    storage: Arc<dyn StorageBackend>,
    tasks: Vec<Task>,
    user: Option<String>,
}

impl TaskStore {
    /// Load store state from the backend, normalizing legacy task records.
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let (tasks, _report) = migrate::load_tasks(storage.as_ref());
        let user = Self::load_user(storage.as_ref());
        Self {
            storage,
            tasks,
            user,
        }
    }

    fn load_user(storage: &dyn StorageBackend) -> Option<String> {
        match storage.read(KEY_USER) {
            Ok(Some(json)) => match serde_json::from_str::<Option<String>>(&json) {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Stored session is malformed, signing out: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    /// All tasks, ordered by ascending due date (insertion order for ties).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The signed-in username, if any.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Create a task from a draft.
    ///
    /// Assigns a fresh id, marks it uncompleted, and re-sorts the collection
    /// by due date. The sort is stable: tasks sharing a due date keep their
    /// existing relative order.
    pub fn create(&mut self, draft: TaskDraft) -> Task {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            is_completed: false,
            priority: draft.priority,
            steps: draft.steps,
            progress: draft.progress,
        };
        self.tasks.push(task.clone());
        self.tasks.sort_by_key(|t| t.due_date);
        self.persist_tasks();
        tracing::debug!("Created task: {}", task.id);
        task
    }

    /// Apply a partial update to the task with the given id.
    ///
    /// `Some` fields overwrite, `None` fields are kept. The collection is
    /// not re-sorted (only creation sorts). Returns the updated task, or
    /// `None` if the id is unknown.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!("Update ignored, no such task: {}", id);
            return None;
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(steps) = patch.steps {
            task.steps = steps;
        }
        if let Some(progress) = patch.progress {
            task.progress = progress;
        }
        if let Some(is_completed) = patch.is_completed {
            task.is_completed = is_completed;
        }

        let updated = task.clone();
        self.persist_tasks();
        tracing::debug!("Updated task: {}", id);
        Some(updated)
    }

    /// Flip the completion flag of the task with the given id.
    ///
    /// Returns the updated task, or `None` if the id is unknown.
    pub fn toggle_complete(&mut self, id: &str) -> Option<Task> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!("Toggle ignored, no such task: {}", id);
            return None;
        };
        task.is_completed = !task.is_completed;
        let updated = task.clone();
        self.persist_tasks();
        Some(updated)
    }

    /// Flip one step of a task and re-derive the task's progress.
    ///
    /// The recomputation is unconditional: it overwrites any manually set
    /// progress with `round(100 * completed / total)` over all steps.
    /// Returns the updated task, or `None` if either id is unknown.
    pub fn toggle_step(&mut self, task_id: &str, step_id: &str) -> Option<Task> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            tracing::debug!("Step toggle ignored, no such task: {}", task_id);
            return None;
        };
        let Some(step) = task.steps.iter_mut().find(|s| s.id == step_id) else {
            tracing::debug!("Step toggle ignored, no such step: {}", step_id);
            return None;
        };
        step.is_completed = !step.is_completed;
        task.progress = progress_from_steps(&task.steps);
        let updated = task.clone();
        self.persist_tasks();
        Some(updated)
    }

    /// Delete the task with the given id. Returns false if the id is unknown.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            tracing::debug!("Delete ignored, no such task: {}", id);
            return false;
        }
        self.persist_tasks();
        tracing::debug!("Deleted task: {}", id);
        true
    }

    /// Start a session for the given display name.
    ///
    /// The name is trimmed; a blank name is rejected.
    pub fn login(&mut self, username: &str) -> StoreResult<String> {
        let name = username.trim();
        if name.is_empty() {
            return Err(StoreError::validation("Username cannot be empty"));
        }
        self.user = Some(name.to_string());
        self.persist_user();
        tracing::info!("Signed in: {}", name);
        Ok(name.to_string())
    }

    /// End the session.
    ///
    /// Tasks are scoped to the signed-in identity, so this clears the task
    /// collection along with the username.
    pub fn logout(&mut self) {
        self.user = None;
        self.tasks.clear();
        self.persist_user();
        self.persist_tasks();
        tracing::info!("Signed out, task collection cleared");
    }

    fn persist_tasks(&self) {
        match serde_json::to_string(&self.tasks) {
            Ok(json) => {
                if let Err(e) = self.storage.write(KEY_TASKS, &json) {
                    tracing::warn!("Failed to persist tasks, in-memory state kept: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize tasks: {}", e),
        }
    }

    fn persist_user(&self) {
        match serde_json::to_string(&self.user) {
            Ok(json) => {
                if let Err(e) = self.storage.write(KEY_USER, &json) {
                    tracing::warn!("Failed to persist session, in-memory state kept: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize session: {}", e),
        }
    }
}
