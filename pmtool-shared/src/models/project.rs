/// Project model
///
/// Projects belong to exactly one organization and are never moved to another.
/// Project names are unique within their organization.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT uniq_project_name_per_org UNIQUE (organization_id, name)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::Patch;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Work in progress (default)
    Active,

    /// Finished
    Completed,

    /// Paused
    OnHold,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
    ];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::OnHold => "ON_HOLD",
        }
    }

    /// Parses status from its stored form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ProjectStatus::Active),
            "COMPLETED" => Some(ProjectStatus::Completed),
            "ON_HOLD" => Some(ProjectStatus::OnHold),
            _ => None,
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

/// A project owned by an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    pub name: String,

    pub description: String,

    pub status: ProjectStatus,

    /// Optional calendar due date
    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

/// Task tallies for one project, computed at read time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Number of tasks in the project
    pub total: i64,

    /// Number of tasks with status DONE
    pub done: i64,
}

impl TaskCounts {
    /// Fraction of tasks that are done; 0.0 for a project without tasks
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Project as returned to callers, with derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,

    pub task_count: i64,

    pub completed_tasks: i64,

    pub completion_rate: f64,
}

impl ProjectView {
    pub fn new(project: Project, counts: TaskCounts) -> Self {
        Self {
            project,
            task_count: counts.total,
            completed_tasks: counts.done,
            completion_rate: counts.completion_rate(),
        }
    }
}

/// Arguments for `createProject`
///
/// `status` is kept as raw text so an unknown value surfaces as a validation
/// error rather than a malformed request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectInput {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Patch<String>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Arguments for `updateProject`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectInput {
    pub id: Uuid,

    #[serde(default)]
    pub name: Patch<String>,

    #[serde(default)]
    pub description: Patch<String>,

    #[serde(default)]
    pub status: Patch<String>,

    #[serde(default)]
    pub due_date: Patch<NaiveDate>,
}

/// Validated project ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
}

/// Validated project column changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}
