/// Operation descriptors and results
///
/// A caller hands the engine one [`Operation`] per request. On the wire it is
/// adjacently tagged:
///
/// ```json
/// { "operation": "createProject", "arguments": { "name": "Launch", "status": "ACTIVE" } }
/// ```
///
/// Operations without arguments (`listOrganizations`, `listProjects`) omit
/// `arguments` or send `null`. Unrecognised argument names are rejected, as
/// are keys other than `operation` and `arguments`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    comment::{AddTaskCommentInput, TaskComment},
    organization::{CreateOrganizationInput, Organization, UpdateOrganizationInput},
    project::{CreateProjectInput, ProjectView, UpdateProjectInput},
    task::{CreateTaskInput, TaskView, UpdateTaskInput},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "operation",
    content = "arguments",
    rename_all = "camelCase",
    deny_unknown_fields
)]
pub enum Operation {
    ListOrganizations,
    GetOrganization { id: Uuid },
    CreateOrganization(CreateOrganizationInput),
    UpdateOrganization(UpdateOrganizationInput),
    DeleteOrganization { id: Uuid },
    ListProjects,
    GetProject { id: Uuid },
    CreateProject(CreateProjectInput),
    UpdateProject(UpdateProjectInput),
    ListTasks { project_id: Uuid },
    GetTask { id: Uuid },
    CreateTask(CreateTaskInput),
    UpdateTask(UpdateTaskInput),
    AddTaskComment(AddTaskCommentInput),
}

impl Operation {
    /// Wire name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListOrganizations => "listOrganizations",
            Operation::GetOrganization { .. } => "getOrganization",
            Operation::CreateOrganization(_) => "createOrganization",
            Operation::UpdateOrganization(_) => "updateOrganization",
            Operation::DeleteOrganization { .. } => "deleteOrganization",
            Operation::ListProjects => "listProjects",
            Operation::GetProject { .. } => "getProject",
            Operation::CreateProject(_) => "createProject",
            Operation::UpdateProject(_) => "updateProject",
            Operation::ListTasks { .. } => "listTasks",
            Operation::GetTask { .. } => "getTask",
            Operation::CreateTask(_) => "createTask",
            Operation::UpdateTask(_) => "updateTask",
            Operation::AddTaskComment(_) => "addTaskComment",
        }
    }

    /// Organization management runs without a tenant; everything else needs one
    pub fn requires_tenant(&self) -> bool {
        !matches!(
            self,
            Operation::ListOrganizations
                | Operation::GetOrganization { .. }
                | Operation::CreateOrganization(_)
                | Operation::UpdateOrganization(_)
                | Operation::DeleteOrganization { .. }
        )
    }
}

/// Successful result of one operation
///
/// Serialized externally tagged, e.g. `{"project": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutput {
    Organizations(Vec<Organization>),
    Organization(Organization),
    Deleted { success: bool },
    Projects(Vec<ProjectView>),
    Project(ProjectView),
    Tasks(Vec<TaskView>),
    Task(TaskView),
    Comment(TaskComment),
}
