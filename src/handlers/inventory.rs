use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entities::inventory_item;
use crate::services::InventoryPage;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct InventoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    50
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/inventory/low-stock", get(low_stock_items))
        .route("/inventory/:part_number", get(get_inventory_item))
}

/// List inventory items, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory page returned"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<InventoryPage> {
    let page = state.inventory.list(query.page, query.limit).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Get one inventory item by part number
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{part_number}",
    params(
        ("part_number" = String, Path, description = "Inventory part number")
    ),
    responses(
        (status = 200, description = "Inventory item returned"),
        (status = 404, description = "No item with that part number", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory_item(
    State(state): State<AppState>,
    Path(part_number): Path<String>,
) -> ApiResult<inventory_item::Model> {
    let item = state.inventory.get(&part_number).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// List items at or below their reorder point
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Low stock items returned"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn low_stock_items(State(state): State<AppState>) -> ApiResult<Vec<inventory_item::Model>> {
    let items = state.inventory.low_stock().await?;
    Ok(Json(ApiResponse::success(items)))
}
