/// Operation endpoint
///
/// Every engine operation goes through one route. The body is an operation
/// descriptor; the tenant comes from the configured organization header.
///
/// # Endpoint
///
/// ```text
/// POST /v1/operations
/// X-Org-Slug: acme
/// ```
///
/// # Request
///
/// ```json
/// {
///   "operation": "createTask",
///   "arguments": { "project_id": "…", "title": "Write copy" }
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "data": {
///     "task": { "id": "…", "title": "Write copy", "status": "TODO", "comments": [] }
///   }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use pmtool_shared::engine::operation::{Operation, OperationOutput};
use serde::Serialize;

/// Successful operation response
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub data: OperationOutput,
}

/// Runs one operation descriptor
///
/// # Errors
///
/// - `400 bad_request`: body is not a known operation descriptor
/// - `400 tenant_unresolved`: tenant-bound operation without a known tenant
/// - `404`, `409`, `422`: as classified by the engine
pub async fn execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<OperationResponse>> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let operation: Operation = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid operation: {}", e)))?;

    let header_value = headers
        .get(state.engine.resolver().header_name())
        .and_then(|v| v.to_str().ok());

    // Organization management never looks at the tenant header
    let tenant = if operation.requires_tenant() {
        state.engine.resolve_tenant(header_value).await?
    } else {
        state.engine.resolver().unresolved()
    };

    let data = state.engine.execute(&tenant, operation).await?;

    Ok(Json(OperationResponse { data }))
}
