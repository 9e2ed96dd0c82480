/// Validation layer
///
/// One function per entity and mutation. Each takes the raw operation
/// arguments and returns either the normalised record to commit or a
/// [`ValidationError`] naming the offending field. None of them touch the
/// store; uniqueness rules that need the store are checked by the engine right
/// after these pass (see [`crate::engine`]).
///
/// Update functions apply the create rules to the fields that were supplied.
/// An explicit `null` clears nullable columns and is rejected for required ones.
///
/// # Example
///
/// ```
/// use pmtool_shared::models::project::CreateProjectInput;
/// use pmtool_shared::validation::validate_new_project;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let err = validate_new_project(
///     CreateProjectInput { name: "X".to_string(), ..Default::default() },
///     today,
/// )
/// .unwrap_err();
///
/// assert_eq!(err.field, "name");
/// assert_eq!(err.message, "Project name must be at least 2 characters long");
/// ```

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    comment::{AddTaskCommentInput, NewTaskComment},
    organization::{
        CreateOrganizationInput, NewOrganization, OrganizationChanges, UpdateOrganizationInput,
    },
    patch::Patch,
    project::{CreateProjectInput, NewProject, ProjectChanges, ProjectStatus, UpdateProjectInput},
    task::{CreateTaskInput, NewTask, TaskChanges, TaskStatus, UpdateTaskInput},
};

/// Minimum trimmed length for names, slugs and titles
pub const MIN_NAME_LENGTH: usize = 2;

/// A field-level rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Argument that failed
    pub field: String,

    /// Human-readable rule description
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn not_null(field: &str) -> Self {
        Self::new(field, format!("{} cannot be null", field))
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn min_trimmed(field: &str, value: &str, message: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::new(field, message));
    }
    Ok(trimmed.to_string())
}

fn email(field: &str, value: &str, message: &str) -> ValidationResult<String> {
    if !value.contains('@') {
        return Err(ValidationError::new(field, message));
    }
    Ok(value.trim().to_string())
}

/// Empty means "no assignee"; anything else must look like an address
fn assignee(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => email("assignee_email", v, "Invalid email format for assignee").map(Some),
    }
}

fn required<T>(field: &str, patch: Patch<T>) -> ValidationResult<Option<T>> {
    match patch {
        Patch::Unset => Ok(None),
        Patch::Null => Err(ValidationError::not_null(field)),
        Patch::Value(v) => Ok(Some(v)),
    }
}

fn org_name(value: &str) -> ValidationResult<String> {
    min_trimmed("name", value, "Organization name must be at least 2 characters long")
}

fn org_slug(value: &str) -> ValidationResult<String> {
    min_trimmed("slug", value, "Organization slug must be at least 2 characters long")
}

fn org_email(value: &str) -> ValidationResult<String> {
    email("contact_email", value, "Invalid email format")
}

fn project_name(value: &str) -> ValidationResult<String> {
    min_trimmed("name", value, "Project name must be at least 2 characters long")
}

fn invalid_project_status() -> ValidationError {
    ValidationError::new(
        "status",
        "Invalid status. Must be one of: ACTIVE, COMPLETED, ON_HOLD",
    )
}

fn project_status(value: &str) -> ValidationResult<ProjectStatus> {
    ProjectStatus::parse(value).ok_or_else(invalid_project_status)
}

fn project_due_date(value: NaiveDate, today: NaiveDate) -> ValidationResult<NaiveDate> {
    if value < today {
        return Err(ValidationError::new("due_date", "Due date cannot be in the past"));
    }
    Ok(value)
}

fn task_title(value: &str) -> ValidationResult<String> {
    min_trimmed("title", value, "Task title must be at least 2 characters long")
}

fn invalid_task_status() -> ValidationError {
    ValidationError::new(
        "status",
        "Invalid status. Must be one of: TODO, IN_PROGRESS, DONE",
    )
}

fn task_status(value: &str) -> ValidationResult<TaskStatus> {
    TaskStatus::parse(value).ok_or_else(invalid_task_status)
}

/// `createOrganization`
pub fn validate_new_organization(input: CreateOrganizationInput) -> ValidationResult<NewOrganization> {
    Ok(NewOrganization {
        name: org_name(&input.name)?,
        slug: org_slug(&input.slug)?,
        contact_email: org_email(&input.contact_email)?,
    })
}

/// `updateOrganization`
pub fn validate_organization_changes(
    input: UpdateOrganizationInput,
) -> ValidationResult<OrganizationChanges> {
    Ok(OrganizationChanges {
        name: required("name", input.name)?.map(|v| org_name(&v)).transpose()?,
        slug: required("slug", input.slug)?.map(|v| org_slug(&v)).transpose()?,
        contact_email: required("contact_email", input.contact_email)?
            .map(|v| org_email(&v))
            .transpose()?,
    })
}

/// `createProject`; `today` bounds the due date
pub fn validate_new_project(input: CreateProjectInput, today: NaiveDate) -> ValidationResult<NewProject> {
    let name = project_name(&input.name)?;
    // An omitted status takes the default; an explicit null names no status.
    let status = match input.status {
        Patch::Unset => ProjectStatus::default(),
        Patch::Null => return Err(invalid_project_status()),
        Patch::Value(s) => project_status(&s)?,
    };
    let due_date = input
        .due_date
        .map(|d| project_due_date(d, today))
        .transpose()?;

    Ok(NewProject {
        name,
        description: input.description.unwrap_or_default(),
        status,
        due_date,
    })
}

/// `updateProject`; the create rules applied to supplied fields
pub fn validate_project_changes(
    input: UpdateProjectInput,
    today: NaiveDate,
) -> ValidationResult<ProjectChanges> {
    let name = required("name", input.name)?
        .map(|v| project_name(&v))
        .transpose()?;
    let status = required("status", input.status)?
        .map(|v| project_status(&v))
        .transpose()?;
    let due_date = match input.due_date {
        Patch::Unset => None,
        Patch::Null => Some(None),
        Patch::Value(d) => Some(Some(project_due_date(d, today)?)),
    };

    Ok(ProjectChanges {
        name,
        description: input.description.into_change().map(Option::unwrap_or_default),
        status,
        due_date,
    })
}

/// `createTask`
pub fn validate_new_task(input: CreateTaskInput) -> ValidationResult<NewTask> {
    let title = task_title(&input.title)?;
    let status = match input.status {
        Patch::Unset => TaskStatus::default(),
        Patch::Null => return Err(invalid_task_status()),
        Patch::Value(s) => task_status(&s)?,
    };
    let assignee_email = assignee(input.assignee_email.as_deref())?;

    Ok(NewTask {
        title,
        description: input.description.unwrap_or_default(),
        status,
        assignee_email,
        due_date: input.due_date,
    })
}

/// `updateTask`
pub fn validate_task_changes(input: UpdateTaskInput) -> ValidationResult<TaskChanges> {
    let title = required("title", input.title)?
        .map(|v| task_title(&v))
        .transpose()?;
    let status = required("status", input.status)?
        .map(|v| task_status(&v))
        .transpose()?;
    let assignee_email = match input.assignee_email {
        Patch::Unset => None,
        Patch::Null => Some(None),
        Patch::Value(v) => Some(assignee(Some(&v))?),
    };

    Ok(TaskChanges {
        title,
        description: input.description.into_change().map(Option::unwrap_or_default),
        status,
        assignee_email,
        due_date: input.due_date.into_change(),
    })
}

/// `addTaskComment`
pub fn validate_new_comment(input: AddTaskCommentInput) -> ValidationResult<NewTaskComment> {
    if input.content.trim().is_empty() {
        return Err(ValidationError::new("content", "Comment content is required"));
    }
    if input.author_email.trim().is_empty() {
        return Err(ValidationError::new(
            "author_email",
            "Comment author email is required",
        ));
    }

    Ok(NewTaskComment {
        content: input.content,
        author_email: input.author_email.trim().to_string(),
    })
}
