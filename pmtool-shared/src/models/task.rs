/// Task model
///
/// Tasks belong to a project and reach their tenant through it. There is no
/// lifecycle restriction on status changes: any status may follow any other.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(20) NOT NULL DEFAULT 'TODO',
///     assignee_email VARCHAR(254),
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comment::TaskComment;
use super::patch::Patch;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started (default)
    Todo,

    /// Being worked on
    InProgress,

    /// Finished; counts toward project completion
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Parses status from its stored form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// A task inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    /// Assignee, if any
    pub assignee_email: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Task as returned to callers, with its comments oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    pub comments: Vec<TaskComment>,
}

/// Arguments for `createTask`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskInput {
    pub project_id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Patch<String>,

    #[serde(default)]
    pub assignee_email: Option<String>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Arguments for `updateTask`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskInput {
    pub id: Uuid,

    #[serde(default)]
    pub title: Patch<String>,

    #[serde(default)]
    pub description: Patch<String>,

    #[serde(default)]
    pub status: Patch<String>,

    #[serde(default)]
    pub assignee_email: Patch<String>,

    #[serde(default)]
    pub due_date: Patch<DateTime<Utc>>,
}

/// Validated task ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee_email: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Validated task column changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    /// `Some(None)` removes the assignee
    pub assignee_email: Option<Option<String>>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignee_email.is_none()
            && self.due_date.is_none()
    }
}
