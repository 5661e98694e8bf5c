//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical record rendered by the presentation layer.
//! - Define view filters and aggregate counts over a collection.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - Tasks created through `Task::create` carry trimmed, non-blank text.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifier of one task, derived from a millisecond clock reading.
///
/// Kept as a type alias so signatures read in domain terms.
pub type TaskId = i64;

/// Single to-do item.
///
/// Serialized field names follow the persisted layout
/// (`id`, `text`, `completed`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique id within the owning collection.
    pub id: TaskId,
    /// User-facing text.
    pub text: String,
    /// Completion flag toggled by the user.
    pub completed: bool,
    /// Unix epoch milliseconds of the clock reading `id` was derived from.
    pub created_at: i64,
}

impl Task {
    /// Creates an active task with already-normalized text.
    pub fn new(id: TaskId, text: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at,
        }
    }

    /// Creates an active task from raw user input.
    ///
    /// Returns `None` when `raw_text` is blank after trimming.
    pub fn create(id: TaskId, raw_text: &str, created_at: i64) -> Option<Self> {
        normalize_task_text(raw_text).map(|text| Self::new(id, text, created_at))
    }

    /// Returns whether this task is visible under `filter`.
    pub fn matches(&self, filter: TaskFilter) -> bool {
        match filter {
            TaskFilter::All => true,
            TaskFilter::Active => !self.completed,
            TaskFilter::Completed => self.completed,
        }
    }
}

/// Trims user input, returning `None` for blank text.
pub fn normalize_task_text(raw_text: &str) -> Option<String> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Visible subset selector for the task view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks with `completed == false`.
    Active,
    /// Tasks with `completed == true`.
    Completed,
}

impl TaskFilter {
    /// Stable lowercase name used by presentation tabs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl Display for TaskFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a filter name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskFilterError(String);

impl Display for ParseTaskFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported task filter `{}`; expected all|active|completed",
            self.0
        )
    }
}

impl Error for ParseTaskFilterError {}

impl FromStr for TaskFilter {
    type Err = ParseTaskFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseTaskFilterError(other.to_string())),
        }
    }
}

/// Active/completed tallies over a full collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    /// Total number of tasks counted.
    pub fn total(&self) -> usize {
        self.active + self.completed
    }
}
