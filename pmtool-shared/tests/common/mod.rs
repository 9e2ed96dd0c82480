#![allow(dead_code)]

/// Common test utilities for engine integration tests
///
/// Builds an [`Engine`] over a fresh [`MemoryStore`] and seeds organizations,
/// projects and tasks with short helper calls.

use pmtool_shared::engine::Engine;
use pmtool_shared::models::organization::{CreateOrganizationInput, Organization};
use pmtool_shared::models::patch::Patch;
use pmtool_shared::models::project::{CreateProjectInput, ProjectView};
use pmtool_shared::models::task::{CreateTaskInput, TaskView};
use pmtool_shared::store::memory::MemoryStore;
use pmtool_shared::tenant::{TenantContext, TenantResolver};
use std::sync::Arc;
use uuid::Uuid;

/// Engine plus a handle on the concrete store for row inspection
pub struct TestContext {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store.clone(), TenantResolver::default());
        Self { engine, store }
    }

    pub async fn organization(&self, slug: &str) -> Organization {
        self.engine
            .create_organization(CreateOrganizationInput {
                name: format!("{} Inc", slug),
                slug: slug.to_string(),
                contact_email: format!("admin@{}.com", slug),
            })
            .await
            .unwrap()
    }

    pub async fn tenant(&self, slug: &str) -> TenantContext {
        self.engine.resolve_tenant(Some(slug)).await.unwrap()
    }

    pub fn no_tenant(&self) -> TenantContext {
        self.engine.resolver().unresolved()
    }

    pub async fn project(&self, tenant: &TenantContext, name: &str) -> ProjectView {
        self.engine
            .create_project(
                tenant,
                CreateProjectInput {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn task(&self, tenant: &TenantContext, project_id: Uuid, title: &str) -> TaskView {
        self.engine
            .create_task(
                tenant,
                CreateTaskInput {
                    project_id,
                    title: title.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn task_with_status(
        &self,
        tenant: &TenantContext,
        project_id: Uuid,
        title: &str,
        status: &str,
    ) -> TaskView {
        self.engine
            .create_task(
                tenant,
                CreateTaskInput {
                    project_id,
                    title: title.to_string(),
                    status: Patch::Value(status.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }
}
