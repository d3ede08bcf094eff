use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Change Approval API

Inventory changes proposed from the dashboard are stored as pending records,
reviewed in bulk, and applied to the inventory collection once approved.

## Envelope

Every endpoint responds with `{ "success": bool, "data"?, "error"?, "message"? }`.
Bulk operations report per-item outcomes inside `data` instead of failing the
whole call.

## Degraded mode

When no database is configured, every `/api/v1` route answers 503 with the
standard envelope.
        "#,
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "pending-changes", description = "Change submission and bulk review"),
        (name = "reconciliation", description = "Batch status drift detection and repair"),
        (name = "inventory", description = "Inventory reads"),
    ),
    paths(
        crate::handlers::pending_changes::list_pending_changes,
        crate::handlers::pending_changes::submit_pending_change,
        crate::handlers::pending_changes::delete_pending_changes,
        crate::handlers::pending_changes::update_pending_statuses,
        crate::handlers::reconciliation::analyze_batch_statuses,
        crate::handlers::reconciliation::repair_batch_statuses,
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory_item,
        crate::handlers::inventory::low_stock_items,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::entities::pending_change::Model,
            crate::entities::pending_change::ChangeStatus,
            crate::entities::pending_change::ChangeType,
            crate::entities::inventory_item::Model,
            crate::handlers::pending_changes::DeleteChangesRequest,
            crate::services::change_requests::ChangeSubmission,
            crate::services::change_requests::StatusUpdate,
            crate::services::change_requests::SubmissionOutcome,
            crate::services::change_requests::BulkStatusOutcome,
            crate::services::inventory::InventoryPage,
            crate::services::inventory_apply::ItemResult,
            crate::services::reconciliation::BatchAnalysis,
            crate::services::reconciliation::RepairSummary,
            crate::validation::ValidationIssue,
            crate::errors::ErrorResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
