/// Entity store: the repository interface behind the engine
///
/// The engine never talks to a database directly. It goes through
/// [`EntityStore`], which has two implementations:
///
/// - `postgres`: [`PgStore`](postgres::PgStore), backed by sqlx and the schema in `migrations/`
/// - `memory`: [`MemoryStore`](memory::MemoryStore), an in-process store for tests and local runs
///
/// # Tenant scoping
///
/// Every project, task and comment method takes a [`TenantScope`]. A scope can
/// only be built from an [`Organization`] record, so a scoped call always
/// filters through a tenant that exists. A record that exists but belongs to
/// another tenant is reported exactly like a missing one (`None` / empty).
///
/// # Uniqueness and cascade
///
/// Implementations must enforce, at commit time:
///
/// - organization slugs are globally unique
/// - project names are unique within an organization
/// - deleting an organization removes its projects, their tasks and the
///   tasks' comments
///
/// A violated uniqueness rule is reported as [`StoreError::Conflict`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    comment::{NewTaskComment, TaskComment},
    organization::{NewOrganization, Organization, OrganizationChanges},
    project::{NewProject, Project, ProjectChanges, TaskCounts},
    task::{NewTask, Task, TaskChanges},
};

/// Which uniqueness rule a write violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueRule {
    /// `organizations.slug`
    OrganizationSlug,

    /// `projects(organization_id, name)`
    ProjectNamePerOrganization,
}

impl UniqueRule {
    /// Constraint name used in the PostgreSQL schema
    pub fn constraint_name(&self) -> &'static str {
        match self {
            UniqueRule::OrganizationSlug => "uniq_organization_slug",
            UniqueRule::ProjectNamePerOrganization => "uniq_project_name_per_org",
        }
    }

    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "uniq_organization_slug" => Some(UniqueRule::OrganizationSlug),
            "uniq_project_name_per_org" => Some(UniqueRule::ProjectNamePerOrganization),
            _ => None,
        }
    }
}

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated at commit time
    #[error("Unique constraint violated: {}", .0.constraint_name())]
    Conflict(UniqueRule),

    /// Database or transport failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data could not be mapped back into a model
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tenant filter applied to every project, task and comment access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    organization_id: Uuid,
}

impl TenantScope {
    /// Scope to the given (resolved) organization
    pub fn of(organization: &Organization) -> Self {
        Self {
            organization_id: organization.id,
        }
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }
}

/// Repository over organizations, projects, tasks and task comments
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Connectivity check used by health checks
    async fn ping(&self) -> StoreResult<()>;

    // Organizations (unscoped)

    /// All organizations, oldest first
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>>;

    async fn get_organization(&self, id: Uuid) -> StoreResult<Option<Organization>>;

    /// Exact (case-sensitive) slug lookup
    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>>;

    /// Whether `slug` is used by an organization other than `exclude`
    async fn organization_slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool>;

    async fn create_organization(&self, data: NewOrganization) -> StoreResult<Organization>;

    /// Applies `changes`; `None` if the organization does not exist
    async fn update_organization(
        &self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> StoreResult<Option<Organization>>;

    /// Deletes the organization and everything beneath it; `false` if absent
    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool>;

    // Projects

    /// Projects of the scoped organization, oldest first
    async fn list_projects(&self, scope: TenantScope) -> StoreResult<Vec<Project>>;

    async fn get_project(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Project>>;

    /// Whether `name` is used by a project of the scoped organization other than `exclude`
    async fn project_name_taken(
        &self,
        scope: TenantScope,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool>;

    /// Inserts a project owned by the scoped organization
    ///
    /// `None` when the organization no longer exists.
    async fn create_project(
        &self,
        scope: TenantScope,
        data: NewProject,
    ) -> StoreResult<Option<Project>>;

    async fn update_project(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>>;

    /// Task tallies for the given projects; projects without tasks (or outside
    /// the scope) are absent from the map
    async fn task_counts(
        &self,
        scope: TenantScope,
        project_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, TaskCounts>>;

    // Tasks

    /// Tasks of a project in the scoped organization, oldest first
    async fn list_tasks(&self, scope: TenantScope, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Task>>;

    /// Inserts a task under `project_id`; `None` if the project is not in scope
    async fn create_task(
        &self,
        scope: TenantScope,
        project_id: Uuid,
        data: NewTask,
    ) -> StoreResult<Option<Task>>;

    async fn update_task(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>>;

    // Comments

    /// Comments of the given tasks, oldest first
    async fn list_comments(
        &self,
        scope: TenantScope,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<TaskComment>>;

    /// Inserts a comment under `task_id`; `None` if the task is not in scope
    async fn create_comment(
        &self,
        scope: TenantScope,
        task_id: Uuid,
        data: NewTaskComment,
    ) -> StoreResult<Option<TaskComment>>;
}
