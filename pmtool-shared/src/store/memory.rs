/// In-process entity store
///
/// Keeps all four tables in memory behind a single `tokio::sync::RwLock`.
/// Every write takes the write lock for its whole check-and-commit, so the
/// uniqueness rules hold under concurrent callers the same way database
/// constraints do: the second of two racing inserts sees the first and fails
/// with [`StoreError::Conflict`].
///
/// Rows are kept in insertion order, which is also `created_at` order.
///
/// # Example
///
/// ```
/// use pmtool_shared::store::{memory::MemoryStore, EntityStore};
/// use pmtool_shared::models::organization::NewOrganization;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let org = store
///     .create_organization(NewOrganization {
///         name: "Acme".to_string(),
///         slug: "acme".to_string(),
///         contact_email: "a@acme.com".to_string(),
///     })
///     .await?;
///
/// assert_eq!(store.find_organization_by_slug("acme").await?, Some(org));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult, TenantScope, UniqueRule};
use crate::models::{
    comment::{NewTaskComment, TaskComment},
    organization::{NewOrganization, Organization, OrganizationChanges},
    project::{NewProject, Project, ProjectChanges, TaskCounts},
    task::{NewTask, Task, TaskChanges, TaskStatus},
};

/// Number of rows per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub organizations: usize,
    pub projects: usize,
    pub tasks: usize,
    pub comments: usize,
}

#[derive(Debug, Default)]
struct Tables {
    organizations: Vec<Organization>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<TaskComment>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// Creation timestamps are kept strictly increasing so insertion order and
    /// `created_at` order never disagree.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(last) if last >= now => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    fn organization_exists(&self, id: Uuid) -> bool {
        self.organizations.iter().any(|o| o.id == id)
    }

    fn project_in_scope(&self, scope: TenantScope, id: Uuid) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id && p.organization_id == scope.organization_id())
    }

    fn task_in_scope(&self, scope: TenantScope, id: Uuid) -> Option<&Task> {
        let task = self.tasks.iter().find(|t| t.id == id)?;
        self.project_in_scope(scope, task.project_id)?;
        Some(task)
    }

    fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> bool {
        self.organizations
            .iter()
            .any(|o| o.slug == slug && Some(o.id) != exclude)
    }

    fn project_name_taken(&self, organization_id: Uuid, name: &str, exclude: Option<Uuid>) -> bool {
        self.projects.iter().any(|p| {
            p.organization_id == organization_id && p.name == name && Some(p.id) != exclude
        })
    }
}

/// Entity store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row count of every table, for inspection in tests
    pub async fn row_counts(&self) -> RowCounts {
        let tables = self.tables.read().await;
        RowCounts {
            organizations: tables.organizations.len(),
            projects: tables.projects.len(),
            tasks: tables.tasks.len(),
            comments: tables.comments.len(),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        Ok(self.tables.read().await.organizations.clone())
    }

    async fn get_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.id == id).cloned())
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.slug == slug).cloned())
    }

    async fn organization_slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        Ok(self.tables.read().await.slug_taken(slug, exclude))
    }

    async fn create_organization(&self, data: NewOrganization) -> StoreResult<Organization> {
        let mut tables = self.tables.write().await;

        if tables.slug_taken(&data.slug, None) {
            return Err(StoreError::Conflict(UniqueRule::OrganizationSlug));
        }

        let organization = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            slug: data.slug,
            contact_email: data.contact_email,
            created_at: tables.next_timestamp(),
        };
        tables.organizations.push(organization.clone());

        Ok(organization)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> StoreResult<Option<Organization>> {
        let mut tables = self.tables.write().await;

        if let Some(slug) = &changes.slug {
            if tables.slug_taken(slug, Some(id)) {
                return Err(StoreError::Conflict(UniqueRule::OrganizationSlug));
            }
        }

        let Some(organization) = tables.organizations.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            organization.name = name;
        }
        if let Some(slug) = changes.slug {
            organization.slug = slug;
        }
        if let Some(contact_email) = changes.contact_email {
            organization.contact_email = contact_email;
        }

        Ok(Some(organization.clone()))
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.organizations.len();
        tables.organizations.retain(|o| o.id != id);
        if tables.organizations.len() == before {
            return Ok(false);
        }

        // Cascade: projects → tasks → comments
        let project_ids: HashSet<Uuid> = tables
            .projects
            .iter()
            .filter(|p| p.organization_id == id)
            .map(|p| p.id)
            .collect();
        tables.projects.retain(|p| !project_ids.contains(&p.id));

        let task_ids: HashSet<Uuid> = tables
            .tasks
            .iter()
            .filter(|t| project_ids.contains(&t.project_id))
            .map(|t| t.id)
            .collect();
        tables.tasks.retain(|t| !task_ids.contains(&t.id));
        tables.comments.retain(|c| !task_ids.contains(&c.task_id));

        Ok(true)
    }

    async fn list_projects(&self, scope: TenantScope) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .filter(|p| p.organization_id == scope.organization_id())
            .cloned()
            .collect())
    }

    async fn get_project(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.project_in_scope(scope, id).cloned())
    }

    async fn project_name_taken(
        &self,
        scope: TenantScope,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.project_name_taken(scope.organization_id(), name, exclude))
    }

    async fn create_project(
        &self,
        scope: TenantScope,
        data: NewProject,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        // The organization may have been deleted since the scope was resolved
        if !tables.organization_exists(scope.organization_id()) {
            return Ok(None);
        }

        if tables.project_name_taken(scope.organization_id(), &data.name, None) {
            return Err(StoreError::Conflict(UniqueRule::ProjectNamePerOrganization));
        }

        let project = Project {
            id: Uuid::new_v4(),
            organization_id: scope.organization_id(),
            name: data.name,
            description: data.description,
            status: data.status,
            due_date: data.due_date,
            created_at: tables.next_timestamp(),
        };
        tables.projects.push(project.clone());

        Ok(Some(project))
    }

    async fn update_project(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        if tables.project_in_scope(scope, id).is_none() {
            return Ok(None);
        }
        if let Some(name) = &changes.name {
            if tables.project_name_taken(scope.organization_id(), name, Some(id)) {
                return Err(StoreError::Conflict(UniqueRule::ProjectNamePerOrganization));
            }
        }

        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(status) = changes.status {
            project.status = status;
        }
        if let Some(due_date) = changes.due_date {
            project.due_date = due_date;
        }

        Ok(Some(project.clone()))
    }

    async fn task_counts(
        &self,
        scope: TenantScope,
        project_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, TaskCounts>> {
        let tables = self.tables.read().await;
        let in_scope: HashSet<Uuid> = project_ids
            .iter()
            .copied()
            .filter(|id| tables.project_in_scope(scope, *id).is_some())
            .collect();

        let mut counts: HashMap<Uuid, TaskCounts> = HashMap::new();
        for task in tables.tasks.iter().filter(|t| in_scope.contains(&t.project_id)) {
            let entry = counts.entry(task.project_id).or_default();
            entry.total += 1;
            if task.status == TaskStatus::Done {
                entry.done += 1;
            }
        }

        Ok(counts)
    }

    async fn list_tasks(&self, scope: TenantScope, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        if tables.project_in_scope(scope, project_id).is_none() {
            return Ok(Vec::new());
        }

        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_task(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.task_in_scope(scope, id).cloned())
    }

    async fn create_task(
        &self,
        scope: TenantScope,
        project_id: Uuid,
        data: NewTask,
    ) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        if tables.project_in_scope(scope, project_id).is_none() {
            return Ok(None);
        }

        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            assignee_email: data.assignee_email,
            due_date: data.due_date,
            created_at: tables.next_timestamp(),
        };
        tables.tasks.push(task.clone());

        Ok(Some(task))
    }

    async fn update_task(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        if tables.task_in_scope(scope, id).is_none() {
            return Ok(None);
        }

        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(assignee_email) = changes.assignee_email {
            task.assignee_email = assignee_email;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }

        Ok(Some(task.clone()))
    }

    async fn list_comments(
        &self,
        scope: TenantScope,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<TaskComment>> {
        let tables = self.tables.read().await;
        let in_scope: HashSet<Uuid> = task_ids
            .iter()
            .copied()
            .filter(|id| tables.task_in_scope(scope, *id).is_some())
            .collect();

        Ok(tables
            .comments
            .iter()
            .filter(|c| in_scope.contains(&c.task_id))
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        scope: TenantScope,
        task_id: Uuid,
        data: NewTaskComment,
    ) -> StoreResult<Option<TaskComment>> {
        let mut tables = self.tables.write().await;
        if tables.task_in_scope(scope, task_id).is_none() {
            return Ok(None);
        }

        let comment = TaskComment {
            id: Uuid::new_v4(),
            task_id,
            content: data.content,
            author_email: data.author_email,
            created_at: tables.next_timestamp(),
        };
        tables.comments.push(comment.clone());

        Ok(Some(comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectStatus;

    fn new_org(slug: &str) -> NewOrganization {
        NewOrganization {
            name: format!("Org {}", slug),
            slug: slug.to_string(),
            contact_email: format!("admin@{}.test", slug),
        }
    }

    fn new_project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            description: String::new(),
            status: ProjectStatus::Active,
            due_date: None,
        }
    }

    fn new_task(title: &str, status: TaskStatus) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status,
            assignee_email: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts_at_commit() {
        let store = MemoryStore::new();
        store.create_organization(new_org("acme")).await.unwrap();

        let err = store.create_organization(new_org("acme")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueRule::OrganizationSlug)));
        assert_eq!(store.row_counts().await.organizations, 1);
    }

    #[tokio::test]
    async fn test_project_lookup_respects_scope() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let other = store.create_organization(new_org("other")).await.unwrap();

        let project = store
            .create_project(TenantScope::of(&acme), new_project("Launch"))
            .await
            .unwrap()
            .unwrap();

        assert!(store
            .get_project(TenantScope::of(&acme), project.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_project(TenantScope::of(&other), project.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.list_projects(TenantScope::of(&other)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_outside_scope_is_rejected() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let other = store.create_organization(new_org("other")).await.unwrap();
        let project = store
            .create_project(TenantScope::of(&acme), new_project("Launch"))
            .await
            .unwrap()
            .unwrap();

        let created = store
            .create_task(TenantScope::of(&other), project.id, new_task("Sneaky", TaskStatus::Todo))
            .await
            .unwrap();

        assert!(created.is_none());
        assert_eq!(store.row_counts().await.tasks, 0);
    }

    #[tokio::test]
    async fn test_create_project_for_deleted_organization_is_rejected() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let stale = TenantScope::of(&acme);
        store.delete_organization(acme.id).await.unwrap();

        let created = store.create_project(stale, new_project("Launch")).await.unwrap();

        assert!(created.is_none());
        assert_eq!(store.row_counts().await, RowCounts::default());
    }

    #[tokio::test]
    async fn test_task_counts_tally_done() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let scope = TenantScope::of(&acme);
        let project = store
            .create_project(scope, new_project("Launch"))
            .await
            .unwrap()
            .unwrap();

        for (title, status) in [
            ("One", TaskStatus::Done),
            ("Two", TaskStatus::Todo),
            ("Three", TaskStatus::InProgress),
        ] {
            store
                .create_task(scope, project.id, new_task(title, status))
                .await
                .unwrap();
        }

        let counts = store.task_counts(scope, &[project.id]).await.unwrap();
        assert_eq!(counts.get(&project.id), Some(&TaskCounts { total: 3, done: 1 }));
    }

    #[tokio::test]
    async fn test_created_at_is_strictly_increasing() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let scope = TenantScope::of(&acme);
        let project = store
            .create_project(scope, new_project("Launch"))
            .await
            .unwrap()
            .unwrap();
        let task = store
            .create_task(scope, project.id, new_task("Write", TaskStatus::Todo))
            .await
            .unwrap()
            .unwrap();

        let mut previous = None;
        for n in 0..5 {
            let comment = store
                .create_comment(
                    scope,
                    task.id,
                    NewTaskComment {
                        content: format!("note {}", n),
                        author_email: "dev@acme.com".to_string(),
                    },
                )
                .await
                .unwrap()
                .unwrap();
            if let Some(prev) = previous {
                assert!(comment.created_at > prev);
            }
            previous = Some(comment.created_at);
        }
    }

    #[tokio::test]
    async fn test_created_at_increases_across_tables() {
        let store = MemoryStore::new();
        let acme = store.create_organization(new_org("acme")).await.unwrap();
        let scope = TenantScope::of(&acme);
        let project = store
            .create_project(scope, new_project("Launch"))
            .await
            .unwrap()
            .unwrap();
        let task = store
            .create_task(scope, project.id, new_task("Write", TaskStatus::Todo))
            .await
            .unwrap()
            .unwrap();
        let globex = store.create_organization(new_org("globex")).await.unwrap();

        assert!(acme.created_at < project.created_at);
        assert!(project.created_at < task.created_at);
        assert!(task.created_at < globex.created_at);
    }
}
