use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::pending_change;
use crate::services::{BulkStatusOutcome, ChangeSubmission, StatusUpdate, SubmissionOutcome};
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/pending-changes",
        get(list_pending_changes)
            .post(submit_pending_change)
            .delete(delete_pending_changes)
            .patch(update_pending_statuses),
    )
}

/// List every pending change, newest first
#[utoipa::path(
    get,
    path = "/api/v1/pending-changes",
    responses(
        (status = 200, description = "Pending changes returned"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "pending-changes"
)]
pub async fn list_pending_changes(
    State(state): State<AppState>,
) -> ApiResult<Vec<pending_change::Model>> {
    let changes = state.change_requests.list().await?;
    Ok(Json(ApiResponse::success(changes)))
}

/// Submit a new change request
#[utoipa::path(
    post,
    path = "/api/v1/pending-changes",
    request_body = ChangeSubmission,
    responses(
        (status = 200, description = "Change request recorded; any validation issues are embedded"),
        (status = 400, description = "No valid items in the submission", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "pending-changes"
)]
pub async fn submit_pending_change(
    State(state): State<AppState>,
    Json(submission): Json<ChangeSubmission>,
) -> ApiResult<SubmissionOutcome> {
    let outcome = state.change_requests.create(submission).await?;
    let message = if outcome.validation_issues.is_empty() {
        "Change request submitted".to_string()
    } else {
        format!(
            "Change request submitted with {} validation issue(s)",
            outcome.validation_issues.len()
        )
    };
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

/// Delete pending changes in bulk
#[utoipa::path(
    delete,
    path = "/api/v1/pending-changes",
    request_body = DeleteChangesRequest,
    responses(
        (status = 200, description = "Matched records deleted"),
        (status = 400, description = "ids missing or empty", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "pending-changes"
)]
pub async fn delete_pending_changes(
    State(state): State<AppState>,
    Json(body): Json<DeleteChangesRequest>,
) -> ApiResult<Value> {
    let deleted = state.change_requests.delete_many(&body.ids).await?;
    Ok(Json(ApiResponse::with_message(
        json!({ "deleted": deleted }),
        format!("Deleted {} pending change(s)", deleted),
    )))
}

/// Apply a status decision to a set of pending changes
///
/// Per-item apply and notification failures are embedded in the response
/// body; only guard violations and the status write itself can fail the
/// call.
#[utoipa::path(
    patch,
    path = "/api/v1/pending-changes",
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status written; per-item results embedded"),
        (status = 400, description = "ids missing or status invalid", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "pending-changes"
)]
pub async fn update_pending_statuses(
    State(state): State<AppState>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<BulkStatusOutcome> {
    let outcome = state.change_requests.update_status(update).await?;
    let message = outcome.message.clone();
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

/// Body of `DELETE /pending-changes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteChangesRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}
