//! Task model types used by the store and the derived views.
//!
//! The serde shape (camelCase field names, RFC 3339 due dates) is the
//! persisted JSON layout; changing it breaks existing user data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A single sub-step of a task. Owned by its parent task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
}

impl Step {
    /// Create a new, uncompleted step with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed: false,
        }
    }
}

/// A task as held in the store and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub priority: Priority,
    pub steps: Vec<Step>,
    /// Completion percentage, 0-100. Recomputed from `steps` on every step
    /// toggle; set manually only while `steps` is empty.
    pub progress: u8,
}

/// Payload for creating a task: everything but the id and completion state,
/// which the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub progress: u8,
}

/// Partial update for an existing task.
///
/// `Some` fields overwrite the stored value; `None` fields keep it.
/// Completion state is normally flipped through `toggle_complete`, but may
/// also be set here.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Completion percentage derived from a step list.
///
/// Rounded to the nearest integer; an empty list yields 0. This is the single
/// authoritative derivation: a step toggle always overwrites any manually set
/// progress with this value.
pub fn progress_from_steps(steps: &[Step]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let completed = steps.iter().filter(|s| s.is_completed).count();
    ((completed as f64 / steps.len() as f64) * 100.0).round() as u8
}
