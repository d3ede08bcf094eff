use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};

use crate::services::{BatchAnalysis, RepairSummary};
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/fix-batch-statuses",
        get(analyze_batch_statuses).post(repair_batch_statuses),
    )
}

/// Report drift between approved batches and actual inventory
#[utoipa::path(
    get,
    path = "/api/v1/fix-batch-statuses",
    responses(
        (status = 200, description = "Per-batch drift report returned"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "reconciliation"
)]
pub async fn analyze_batch_statuses(State(state): State<AppState>) -> ApiResult<Vec<BatchAnalysis>> {
    let report = state.reconciliation.analyze().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Repair item sub-statuses for batches that drifted
#[utoipa::path(
    post,
    path = "/api/v1/fix-batch-statuses",
    responses(
        (status = 200, description = "Repair summary returned"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "reconciliation"
)]
pub async fn repair_batch_statuses(State(state): State<AppState>) -> ApiResult<RepairSummary> {
    let summary = state.reconciliation.repair().await?;
    let message = format!(
        "Fixed {} of {} approved batch(es)",
        summary.fixed_batches, summary.total_processed
    );
    Ok(Json(ApiResponse::with_message(summary, message)))
}
