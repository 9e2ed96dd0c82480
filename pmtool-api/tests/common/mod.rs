#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - A router over a fresh in-memory store
/// - Request helpers for the operation endpoint
/// - Organization seeding

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pmtool_api::app::{build_router, AppState};
use pmtool_api::config::{ApiConfig, Config, LogFormat};
use pmtool_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt as _;

/// Test context containing the router under test
pub struct TestContext {
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        let state = AppState::new(Arc::new(MemoryStore::new()), config.clone());
        Self {
            app: build_router(state),
            config,
        }
    }

    /// Posts an operation descriptor, optionally under a tenant slug
    pub async fn call(&self, tenant: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/operations")
            .header("content-type", "application/json");
        if let Some(slug) = tenant {
            builder = builder.header(self.config.org_header.as_str(), slug);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        self.send(request).await
    }

    pub async fn operation(
        &self,
        tenant: Option<&str>,
        operation: &str,
        arguments: Value,
    ) -> (StatusCode, Value) {
        self.call(tenant, json!({ "operation": operation, "arguments": arguments }))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    /// Creates an organization and returns its JSON
    pub async fn organization(&self, slug: &str) -> Value {
        let (status, body) = self
            .operation(
                None,
                "createOrganization",
                json!({
                    "name": format!("{} Inc", slug),
                    "slug": slug,
                    "contact_email": format!("admin@{}.com", slug),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["organization"].clone()
    }

    /// Creates a project under the tenant and returns its JSON
    pub async fn project(&self, tenant: &str, name: &str) -> Value {
        let (status, body) = self
            .operation(Some(tenant), "createProject", json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["project"].clone()
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
        },
        database: None,
        org_header: "X-Org-Slug".to_string(),
        log_format: LogFormat::Plain,
    }
}
