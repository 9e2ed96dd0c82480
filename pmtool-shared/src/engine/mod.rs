/// Query/mutation engine
///
/// The engine runs one operation at a time against an [`EntityStore`]:
///
/// ```text
/// require tenant (if the operation is tenant-bound)
///   → field validation (pure, no store access)
///   → resolve target / parent entity through the tenant scope
///   → uniqueness checks
///   → commit
///   → read back derived fields
/// ```
///
/// Any step can fail; the commit is the only write and comes last, so a failed
/// operation leaves no trace. The engine holds no per-request state and is
/// cheap to clone.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pmtool_shared::engine::Engine;
/// use pmtool_shared::models::organization::CreateOrganizationInput;
/// use pmtool_shared::store::memory::MemoryStore;
/// use pmtool_shared::tenant::TenantResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::new(Arc::new(MemoryStore::new()), TenantResolver::default());
///
/// engine
///     .create_organization(CreateOrganizationInput {
///         name: "Acme".to_string(),
///         slug: "acme".to_string(),
///         contact_email: "a@acme.com".to_string(),
///     })
///     .await?;
///
/// let tenant = engine.resolve_tenant(Some("acme")).await?;
/// let projects = engine.list_projects(&tenant).await?;
/// assert!(projects.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod error;
pub mod operation;

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    comment::{AddTaskCommentInput, TaskComment},
    organization::{CreateOrganizationInput, Organization, UpdateOrganizationInput},
    project::{CreateProjectInput, Project, ProjectView, UpdateProjectInput},
    task::{CreateTaskInput, Task, TaskView, UpdateTaskInput},
};
use crate::store::{EntityStore, TenantScope, UniqueRule};
use crate::tenant::{TenantContext, TenantResolver};
use crate::validation;

use self::error::{EngineError, EngineResult, Entity};
use self::operation::{Operation, OperationOutput};

/// Tenant-scoped query/mutation engine
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn EntityStore>,
    resolver: TenantResolver,
}

impl Engine {
    pub fn new(store: Arc<dyn EntityStore>, resolver: TenantResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// Resolves the tenant header value for one request
    pub async fn resolve_tenant(&self, header_value: Option<&str>) -> EngineResult<TenantContext> {
        Ok(self.resolver.resolve(self.store(), header_value).await?)
    }

    /// Runs a single operation under the given tenant context
    pub async fn execute(
        &self,
        tenant: &TenantContext,
        operation: Operation,
    ) -> EngineResult<OperationOutput> {
        let name = operation.name();
        debug!(
            operation = name,
            tenant = ?tenant.organization().map(|o| o.slug.as_str()),
            "Executing operation"
        );

        let result = self.dispatch(tenant, operation).await;

        if let Err(err) = &result {
            warn!(operation = name, kind = err.kind().as_str(), error = %err, "Operation failed");
        }

        result
    }

    async fn dispatch(
        &self,
        tenant: &TenantContext,
        operation: Operation,
    ) -> EngineResult<OperationOutput> {
        Ok(match operation {
            Operation::ListOrganizations => {
                OperationOutput::Organizations(self.list_organizations().await?)
            }
            Operation::GetOrganization { id } => {
                OperationOutput::Organization(self.get_organization(id).await?)
            }
            Operation::CreateOrganization(input) => {
                OperationOutput::Organization(self.create_organization(input).await?)
            }
            Operation::UpdateOrganization(input) => {
                OperationOutput::Organization(self.update_organization(input).await?)
            }
            Operation::DeleteOrganization { id } => {
                self.delete_organization(id).await?;
                OperationOutput::Deleted { success: true }
            }
            Operation::ListProjects => OperationOutput::Projects(self.list_projects(tenant).await?),
            Operation::GetProject { id } => {
                OperationOutput::Project(self.get_project(tenant, id).await?)
            }
            Operation::CreateProject(input) => {
                OperationOutput::Project(self.create_project(tenant, input).await?)
            }
            Operation::UpdateProject(input) => {
                OperationOutput::Project(self.update_project(tenant, input).await?)
            }
            Operation::ListTasks { project_id } => {
                OperationOutput::Tasks(self.list_tasks(tenant, project_id).await?)
            }
            Operation::GetTask { id } => OperationOutput::Task(self.get_task(tenant, id).await?),
            Operation::CreateTask(input) => {
                OperationOutput::Task(self.create_task(tenant, input).await?)
            }
            Operation::UpdateTask(input) => {
                OperationOutput::Task(self.update_task(tenant, input).await?)
            }
            Operation::AddTaskComment(input) => {
                OperationOutput::Comment(self.add_task_comment(tenant, input).await?)
            }
        })
    }

    // Organizations

    pub async fn list_organizations(&self) -> EngineResult<Vec<Organization>> {
        Ok(self.store.list_organizations().await?)
    }

    pub async fn get_organization(&self, id: Uuid) -> EngineResult<Organization> {
        self.store
            .get_organization(id)
            .await?
            .ok_or(EngineError::NotFound(Entity::Organization))
    }

    pub async fn create_organization(
        &self,
        input: CreateOrganizationInput,
    ) -> EngineResult<Organization> {
        let data = validation::validate_new_organization(input)?;

        if self.store.organization_slug_taken(&data.slug, None).await? {
            return Err(EngineError::Conflict(UniqueRule::OrganizationSlug));
        }

        let organization = self.store.create_organization(data).await?;
        info!(organization_id = %organization.id, slug = %organization.slug, "Organization created");

        Ok(organization)
    }

    pub async fn update_organization(
        &self,
        input: UpdateOrganizationInput,
    ) -> EngineResult<Organization> {
        let id = input.id;
        let changes = validation::validate_organization_changes(input)?;

        self.get_organization(id).await?;

        if let Some(slug) = &changes.slug {
            if self.store.organization_slug_taken(slug, Some(id)).await? {
                return Err(EngineError::Conflict(UniqueRule::OrganizationSlug));
            }
        }

        let organization = self
            .store
            .update_organization(id, changes)
            .await?
            .ok_or(EngineError::NotFound(Entity::Organization))?;
        info!(organization_id = %organization.id, "Organization updated");

        Ok(organization)
    }

    /// Deletes the organization with all of its projects, tasks and comments
    pub async fn delete_organization(&self, id: Uuid) -> EngineResult<()> {
        if !self.store.delete_organization(id).await? {
            return Err(EngineError::NotFound(Entity::Organization));
        }
        info!(organization_id = %id, "Organization deleted");

        Ok(())
    }

    // Projects

    pub async fn list_projects(&self, tenant: &TenantContext) -> EngineResult<Vec<ProjectView>> {
        let scope = tenant.require()?;
        let projects = self.store.list_projects(scope).await?;
        self.project_views(scope, projects).await
    }

    pub async fn get_project(&self, tenant: &TenantContext, id: Uuid) -> EngineResult<ProjectView> {
        let scope = tenant.require()?;
        let project = self.find_project(scope, id).await?;
        self.project_view(scope, project).await
    }

    pub async fn create_project(
        &self,
        tenant: &TenantContext,
        input: CreateProjectInput,
    ) -> EngineResult<ProjectView> {
        let scope = tenant.require()?;
        let data = validation::validate_new_project(input, today())?;

        if self.store.project_name_taken(scope, &data.name, None).await? {
            return Err(EngineError::Conflict(UniqueRule::ProjectNamePerOrganization));
        }

        let project = self
            .store
            .create_project(scope, data)
            .await?
            .ok_or_else(|| EngineError::TenantUnresolved {
                header: self.resolver.header_name().to_string(),
            })?;
        info!(
            organization_id = %scope.organization_id(),
            project_id = %project.id,
            "Project created"
        );

        self.project_view(scope, project).await
    }

    pub async fn update_project(
        &self,
        tenant: &TenantContext,
        input: UpdateProjectInput,
    ) -> EngineResult<ProjectView> {
        let scope = tenant.require()?;
        let id = input.id;
        let changes = validation::validate_project_changes(input, today())?;

        self.find_project(scope, id).await?;

        if let Some(name) = &changes.name {
            if self.store.project_name_taken(scope, name, Some(id)).await? {
                return Err(EngineError::Conflict(UniqueRule::ProjectNamePerOrganization));
            }
        }

        let project = self
            .store
            .update_project(scope, id, changes)
            .await?
            .ok_or(EngineError::NotFound(Entity::Project))?;
        info!(project_id = %project.id, "Project updated");

        self.project_view(scope, project).await
    }

    // Tasks

    pub async fn list_tasks(
        &self,
        tenant: &TenantContext,
        project_id: Uuid,
    ) -> EngineResult<Vec<TaskView>> {
        let scope = tenant.require()?;
        self.find_project(scope, project_id).await?;

        let tasks = self.store.list_tasks(scope, project_id).await?;
        self.task_views(scope, tasks).await
    }

    pub async fn get_task(&self, tenant: &TenantContext, id: Uuid) -> EngineResult<TaskView> {
        let scope = tenant.require()?;
        let task = self.find_task(scope, id).await?;
        self.task_view(scope, task).await
    }

    pub async fn create_task(
        &self,
        tenant: &TenantContext,
        input: CreateTaskInput,
    ) -> EngineResult<TaskView> {
        let scope = tenant.require()?;
        let project_id = input.project_id;
        let data = validation::validate_new_task(input)?;

        let task = self
            .store
            .create_task(scope, project_id, data)
            .await?
            .ok_or(EngineError::NotFound(Entity::Project))?;
        info!(project_id = %project_id, task_id = %task.id, "Task created");

        Ok(TaskView {
            task,
            comments: Vec::new(),
        })
    }

    pub async fn update_task(
        &self,
        tenant: &TenantContext,
        input: UpdateTaskInput,
    ) -> EngineResult<TaskView> {
        let scope = tenant.require()?;
        let id = input.id;
        let changes = validation::validate_task_changes(input)?;

        let task = self
            .store
            .update_task(scope, id, changes)
            .await?
            .ok_or(EngineError::NotFound(Entity::Task))?;
        info!(task_id = %task.id, status = task.status.as_str(), "Task updated");

        self.task_view(scope, task).await
    }

    // Comments

    pub async fn add_task_comment(
        &self,
        tenant: &TenantContext,
        input: AddTaskCommentInput,
    ) -> EngineResult<TaskComment> {
        let scope = tenant.require()?;
        let task_id = input.task_id;
        let data = validation::validate_new_comment(input)?;

        let comment = self
            .store
            .create_comment(scope, task_id, data)
            .await?
            .ok_or(EngineError::NotFound(Entity::Task))?;
        info!(task_id = %task_id, comment_id = %comment.id, "Comment added");

        Ok(comment)
    }

    // Helpers

    async fn find_project(&self, scope: TenantScope, id: Uuid) -> EngineResult<Project> {
        self.store
            .get_project(scope, id)
            .await?
            .ok_or(EngineError::NotFound(Entity::Project))
    }

    async fn find_task(&self, scope: TenantScope, id: Uuid) -> EngineResult<Task> {
        self.store
            .get_task(scope, id)
            .await?
            .ok_or(EngineError::NotFound(Entity::Task))
    }

    async fn project_view(&self, scope: TenantScope, project: Project) -> EngineResult<ProjectView> {
        let mut views = self.project_views(scope, vec![project]).await?;
        views.pop().ok_or(EngineError::NotFound(Entity::Project))
    }

    async fn project_views(
        &self,
        scope: TenantScope,
        projects: Vec<Project>,
    ) -> EngineResult<Vec<ProjectView>> {
        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let counts = self.store.task_counts(scope, &ids).await?;

        Ok(projects
            .into_iter()
            .map(|project| {
                let tally = counts.get(&project.id).copied().unwrap_or_default();
                ProjectView::new(project, tally)
            })
            .collect())
    }

    async fn task_view(&self, scope: TenantScope, task: Task) -> EngineResult<TaskView> {
        let mut views = self.task_views(scope, vec![task]).await?;
        views.pop().ok_or(EngineError::NotFound(Entity::Task))
    }

    async fn task_views(&self, scope: TenantScope, tasks: Vec<Task>) -> EngineResult<Vec<TaskView>> {
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut by_task: HashMap<Uuid, Vec<TaskComment>> = HashMap::new();
        for comment in self.store.list_comments(scope, &ids).await? {
            by_task.entry(comment.task_id).or_default().push(comment);
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let comments = by_task.remove(&task.id).unwrap_or_default();
                TaskView { task, comments }
            })
            .collect())
    }
}

/// Lower bound for project due dates
fn today() -> NaiveDate {
    Utc::now().date_naive()
}
