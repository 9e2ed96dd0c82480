/// PostgreSQL entity store
///
/// Tenant scoping is expressed in SQL: project queries filter on
/// `organization_id`, task and comment queries join through `projects`.
/// Uniqueness and cascade are enforced by the schema (see `migrations/`);
/// unique violations are mapped to [`StoreError::Conflict`] by constraint name.
///
/// # Example
///
/// ```no_run
/// use pmtool_shared::db::pool::{create_pool, DatabaseConfig};
/// use pmtool_shared::store::{postgres::PgStore, EntityStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// let organizations = store.list_organizations().await?;
/// println!("{} organizations", organizations.len());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult, TenantScope, UniqueRule};
use crate::models::{
    comment::{NewTaskComment, TaskComment},
    organization::{NewOrganization, Organization, OrganizationChanges},
    project::{NewProject, Project, ProjectChanges, ProjectStatus, TaskCounts},
    task::{NewTask, Task, TaskChanges, TaskStatus},
};

const ORGANIZATION_COLUMNS: &str = "id, name, slug, contact_email, created_at";

const PROJECT_COLUMNS: &str =
    "p.id, p.organization_id, p.name, p.description, p.status, p.due_date, p.created_at";

const TASK_COLUMNS: &str = "t.id, t.project_id, t.title, t.description, t.status, \
     t.assignee_email, t.due_date, t.created_at";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    description: String,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = ProjectStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("project {} has unknown status {}", row.id, row.status))
        })?;

        Ok(Project {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            status,
            due_date: row.due_date,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: String,
    status: String,
    assignee_email: Option<String>,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("task {} has unknown status {}", row.id, row.status))
        })?;

        Ok(Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status,
            assignee_email: row.assignee_email,
            due_date: row.due_date,
            created_at: row.created_at,
        })
    }
}

/// Maps sqlx errors, turning unique violations into conflicts
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(rule) = db_err.constraint().and_then(UniqueRule::from_constraint) {
                return StoreError::Conflict(rule);
            }
        }
    }
    StoreError::Database(err)
}

/// Entity store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations ORDER BY created_at ASC",
            ORGANIZATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }

    async fn get_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn find_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE slug = $1",
            ORGANIZATION_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn organization_slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM organizations
                WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_organization(&self, data: NewOrganization) -> StoreResult<Organization> {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (name, slug, contact_email) VALUES ($1, $2, $3) RETURNING {}",
            ORGANIZATION_COLUMNS
        ))
        .bind(data.name)
        .bind(data.slug)
        .bind(data.contact_email)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(organization)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> StoreResult<Option<Organization>> {
        if changes.is_empty() {
            return self.get_organization(id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 1;

        if changes.name.is_some() {
            bind_count += 1;
            sets.push(format!("name = ${}", bind_count));
        }
        if changes.slug.is_some() {
            bind_count += 1;
            sets.push(format!("slug = ${}", bind_count));
        }
        if changes.contact_email.is_some() {
            bind_count += 1;
            sets.push(format!("contact_email = ${}", bind_count));
        }

        let query = format!(
            "UPDATE organizations SET {} WHERE id = $1 RETURNING {}",
            sets.join(", "),
            ORGANIZATION_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Organization>(&query).bind(id);
        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(slug) = changes.slug {
            q = q.bind(slug);
        }
        if let Some(contact_email) = changes.contact_email {
            q = q.bind(contact_email);
        }

        let organization = q.fetch_optional(&self.pool).await.map_err(classify)?;

        Ok(organization)
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        // Projects, tasks and comments go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, scope: TenantScope) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects p WHERE p.organization_id = $1 ORDER BY p.created_at ASC",
            PROJECT_COLUMNS
        ))
        .bind(scope.organization_id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn get_project(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects p WHERE p.id = $1 AND p.organization_id = $2",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(scope.organization_id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn project_name_taken(
        &self,
        scope: TenantScope,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM projects
                WHERE organization_id = $1 AND name = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(scope.organization_id())
        .bind(name)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_project(
        &self,
        scope: TenantScope,
        data: NewProject,
    ) -> StoreResult<Option<Project>> {
        // INSERT ... SELECT inserts nothing once the organization is gone
        let result = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects AS p (organization_id, name, description, status, due_date)
            SELECT o.id, $2, $3, $4, $5
            FROM organizations o
            WHERE o.id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(scope.organization_id())
        .bind(data.name)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.due_date)
        .fetch_optional(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            // Deleted between the SELECT and the foreign key check
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => None,
            Err(err) => return Err(classify(err)),
        };

        row.map(Project::try_from).transpose()
    }

    async fn update_project(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        if changes.is_empty() {
            return self.get_project(scope, id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 2;

        if changes.name.is_some() {
            bind_count += 1;
            sets.push(format!("name = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            sets.push(format!("description = ${}", bind_count));
        }
        if changes.status.is_some() {
            bind_count += 1;
            sets.push(format!("status = ${}", bind_count));
        }
        if changes.due_date.is_some() {
            bind_count += 1;
            sets.push(format!("due_date = ${}", bind_count));
        }

        let query = format!(
            "UPDATE projects AS p SET {} WHERE p.id = $1 AND p.organization_id = $2 RETURNING {}",
            sets.join(", "),
            PROJECT_COLUMNS
        );

        let mut q = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(scope.organization_id());
        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(status) = changes.status {
            q = q.bind(status.as_str());
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }

        let row = q.fetch_optional(&self.pool).await.map_err(classify)?;

        row.map(Project::try_from).transpose()
    }

    async fn task_counts(
        &self,
        scope: TenantScope,
        project_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, TaskCounts>> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64, i64)> = sqlx::query_as(
            r#"
            SELECT t.project_id,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE t.status = 'DONE') AS done
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.organization_id = $1 AND t.project_id = ANY($2)
            GROUP BY t.project_id
            "#,
        )
        .bind(scope.organization_id())
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(project_id, total, done)| (project_id, TaskCounts { total, done }))
            .collect())
    }

    async fn list_tasks(&self, scope: TenantScope, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {}
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.project_id = $1 AND p.organization_id = $2
            ORDER BY t.created_at ASC
            "#,
            TASK_COLUMNS
        ))
        .bind(project_id)
        .bind(scope.organization_id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn get_task(&self, scope: TenantScope, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {}
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.organization_id = $2
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(scope.organization_id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn create_task(
        &self,
        scope: TenantScope,
        project_id: Uuid,
        data: NewTask,
    ) -> StoreResult<Option<Task>> {
        // INSERT ... SELECT inserts nothing when the project is outside the scope
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks AS t (project_id, title, description, status, assignee_email, due_date)
            SELECT p.id, $3, $4, $5, $6, $7
            FROM projects p
            WHERE p.id = $1 AND p.organization_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(project_id)
        .bind(scope.organization_id())
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.assignee_email)
        .bind(data.due_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(Task::try_from).transpose()
    }

    async fn update_task(
        &self,
        scope: TenantScope,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        if changes.is_empty() {
            return self.get_task(scope, id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 2;

        if changes.title.is_some() {
            bind_count += 1;
            sets.push(format!("title = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            sets.push(format!("description = ${}", bind_count));
        }
        if changes.status.is_some() {
            bind_count += 1;
            sets.push(format!("status = ${}", bind_count));
        }
        if changes.assignee_email.is_some() {
            bind_count += 1;
            sets.push(format!("assignee_email = ${}", bind_count));
        }
        if changes.due_date.is_some() {
            bind_count += 1;
            sets.push(format!("due_date = ${}", bind_count));
        }

        let query = format!(
            r#"
            UPDATE tasks AS t SET {}
            FROM projects p
            WHERE t.id = $1 AND p.id = t.project_id AND p.organization_id = $2
            RETURNING {}
            "#,
            sets.join(", "),
            TASK_COLUMNS
        );

        let mut q = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(scope.organization_id());
        if let Some(title) = changes.title {
            q = q.bind(title);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(status) = changes.status {
            q = q.bind(status.as_str());
        }
        if let Some(assignee_email) = changes.assignee_email {
            q = q.bind(assignee_email);
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }

        let row = q.fetch_optional(&self.pool).await.map_err(classify)?;

        row.map(Task::try_from).transpose()
    }

    async fn list_comments(
        &self,
        scope: TenantScope,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<TaskComment>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let comments = sqlx::query_as::<_, TaskComment>(
            r#"
            SELECT c.id, c.task_id, c.content, c.author_email, c.created_at
            FROM task_comments c
            JOIN tasks t ON t.id = c.task_id
            JOIN projects p ON p.id = t.project_id
            WHERE c.task_id = ANY($1) AND p.organization_id = $2
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_ids)
        .bind(scope.organization_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn create_comment(
        &self,
        scope: TenantScope,
        task_id: Uuid,
        data: NewTaskComment,
    ) -> StoreResult<Option<TaskComment>> {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            INSERT INTO task_comments AS c (task_id, content, author_email)
            SELECT t.id, $3, $4
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.organization_id = $2
            RETURNING c.id, c.task_id, c.content, c.author_email, c.created_at
            "#,
        )
        .bind(task_id)
        .bind(scope.organization_id())
        .bind(data.content)
        .bind(data.author_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(comment)
    }
}
