/// Task comment model
///
/// Comments are append-only in this system: they are added to a task and
/// disappear only when the task (or one of its ancestors) is deleted.
/// They are always listed oldest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskComment {
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    pub content: String,

    pub author_email: String,

    pub created_at: DateTime<Utc>,
}

/// Arguments for `addTaskComment`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTaskCommentInput {
    pub task_id: Uuid,
    pub content: String,
    pub author_email: String,
}

/// Validated comment ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskComment {
    pub content: String,
    pub author_email: String,
}
