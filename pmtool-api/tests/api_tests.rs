/// Integration tests for the pmtool API
///
/// These tests drive the full router over an in-memory store:
/// - Operation descriptors and response envelopes
/// - Error classification to status codes
/// - Tenant isolation through the organization header
/// - Health check

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_acme_scenario() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .operation(
            None,
            "createOrganization",
            json!({ "name": "Acme", "slug": "acme", "contact_email": "a@acme.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["organization"]["slug"], "acme");

    let (status, body) = ctx
        .operation(
            None,
            "createOrganization",
            json!({ "name": "Acme 2", "slug": "acme", "contact_email": "b@acme.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "An organization with this slug already exists");

    let project = ctx.project("acme", "Launch").await;
    assert_eq!(project["name"], "Launch");
    assert_eq!(project["status"], "ACTIVE");
    assert_eq!(project["task_count"], 0);
    assert_eq!(project["completion_rate"], 0.0);

    ctx.organization("techcorp").await;
    let (status, body) = ctx.call(Some("techcorp"), json!({ "operation": "listProjects" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projects"], json!([]));
}

#[tokio::test]
async fn test_missing_tenant_is_bad_request() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;

    let (status, body) = ctx.call(None, json!({ "operation": "listProjects" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant_unresolved");
    assert_eq!(
        body["message"],
        "Organization not resolved. Provide header 'X-Org-Slug'."
    );

    let (status, body) = ctx.call(Some("unknown"), json!({ "operation": "listProjects" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant_unresolved");
}

#[tokio::test]
async fn test_organization_operations_ignore_tenant() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;

    let (status, body) = ctx
        .call(Some("does-not-exist"), json!({ "operation": "listOrganizations" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["organizations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_descriptor() {
    let ctx = TestContext::new();

    let (status, body) = ctx.call(None, json!({ "operation": "dropTables" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .operation(None, "getOrganization", json!({ "id": "not-a-uuid" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/operations")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_validation_error_shape() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;

    let (status, body) = ctx
        .operation(Some("acme"), "createProject", json!({ "name": "L" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "Project name must be at least 2 characters long");
    assert_eq!(
        body["details"],
        json!([{ "field": "name", "message": "Project name must be at least 2 characters long" }])
    );

    let (_, body) = ctx.call(Some("acme"), json!({ "operation": "listProjects" })).await;
    assert_eq!(body["data"]["projects"], json!([]));
}

#[tokio::test]
async fn test_foreign_ids_are_not_found() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;
    ctx.organization("globex").await;
    let project = ctx.project("acme", "Launch").await;

    let (status, body) = ctx
        .operation(Some("globex"), "getProject", json!({ "id": project["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Project not found");

    let (status, _) = ctx
        .operation(
            Some("globex"),
            "createTask",
            json!({ "project_id": project["id"], "title": "Sneaky" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .operation(Some("acme"), "getTask", json!({ "id": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;
    let project = ctx.project("acme", "Launch").await;

    let (status, body) = ctx
        .operation(
            Some("acme"),
            "createTask",
            json!({
                "project_id": project["id"],
                "title": "Write copy",
                "assignee_email": "dev@acme.com",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let task = body["data"]["task"].clone();
    assert_eq!(task["status"], "TODO");
    assert_eq!(task["comments"], json!([]));

    let (status, body) = ctx
        .operation(
            Some("acme"),
            "updateTask",
            json!({ "id": task["id"], "status": "DONE", "assignee_email": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["task"]["status"], "DONE");
    assert_eq!(body["data"]["task"]["title"], "Write copy");
    assert_eq!(body["data"]["task"]["assignee_email"], json!(null));

    let (status, body) = ctx
        .operation(
            Some("acme"),
            "addTaskComment",
            json!({ "task_id": task["id"], "content": "Shipped", "author_email": "pm@acme.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["comment"]["content"], "Shipped");

    let (status, body) = ctx
        .operation(Some("acme"), "listTasks", json!({ "project_id": project["id"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["comments"][0]["author_email"], "pm@acme.com");

    let (_, body) = ctx
        .operation(Some("acme"), "getProject", json!({ "id": project["id"] }))
        .await;
    assert_eq!(body["data"]["project"]["task_count"], 1);
    assert_eq!(body["data"]["project"]["completed_tasks"], 1);
    assert_eq!(body["data"]["project"]["completion_rate"], 1.0);
}

#[tokio::test]
async fn test_null_on_required_field_is_rejected() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;
    let project = ctx.project("acme", "Launch").await;

    let (status, body) = ctx
        .operation(Some("acme"), "updateProject", json!({ "id": project["id"], "name": null }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "name cannot be null");
}

#[tokio::test]
async fn test_null_status_on_create_is_rejected() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;

    let (status, body) = ctx
        .operation(Some("acme"), "createProject", json!({ "name": "Launch", "status": null }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "status");
    assert_eq!(body["message"], "Invalid status. Must be one of: ACTIVE, COMPLETED, ON_HOLD");

    let (_, body) = ctx.call(Some("acme"), json!({ "operation": "listProjects" })).await;
    assert_eq!(body["data"]["projects"], json!([]));
}

#[tokio::test]
async fn test_unknown_argument_is_bad_request() {
    let ctx = TestContext::new();
    ctx.organization("acme").await;
    let project = ctx.project("acme", "Launch").await;

    let (status, body) = ctx
        .operation(
            Some("acme"),
            "updateProject",
            json!({ "id": project["id"], "stauts": "COMPLETED" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .call(
            Some("acme"),
            json!({ "operation": "listProjects", "argumnets": { "id": project["id"] } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, body) = ctx
        .operation(Some("acme"), "getProject", json!({ "id": project["id"] }))
        .await;
    assert_eq!(body["data"]["project"]["status"], "ACTIVE");
}

#[tokio::test]
async fn test_delete_organization() {
    let ctx = TestContext::new();
    let acme = ctx.organization("acme").await;
    ctx.project("acme", "Launch").await;

    let (status, body) = ctx
        .operation(None, "deleteOrganization", json!({ "id": acme["id"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"]["success"], true);

    let (status, body) = ctx.call(Some("acme"), json!({ "operation": "listProjects" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant_unresolved");

    let (status, _) = ctx
        .operation(None, "deleteOrganization", json!({ "id": acme["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
