use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::inventory_item::{self, Entity as InventoryItem, Model as InventoryItemModel};
use crate::errors::ServiceError;

const MAX_PAGE_SIZE: u64 = 100;

/// Read-side queries over the inventory collection. All writes go through
/// the applier.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Newest-first page of inventory items. Pages are 1-based.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, limit: u64) -> Result<InventoryPage, ServiceError> {
        let db = self.db_pool.as_ref();
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let paginator = InventoryItem::find()
            .order_by_desc(inventory_item::Column::CreatedAt)
            .paginate(db, limit);
        let total_items = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let total_pages = paginator
            .num_pages()
            .await
            .map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(InventoryPage {
            items,
            total_items,
            total_pages,
            page,
            limit,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, part_number: &str) -> Result<InventoryItemModel, ServiceError> {
        let db = self.db_pool.as_ref();
        InventoryItem::find_by_id(part_number.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No inventory item found for part number {}",
                    part_number
                ))
            })
    }

    /// Items at or below their reorder point, lowest stock first.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<InventoryItemModel>, ServiceError> {
        let db = self.db_pool.as_ref();
        InventoryItem::find()
            .filter(
                Expr::col(inventory_item::Column::Qty)
                    .lte(Expr::col(inventory_item::Column::ReorderPoint)),
            )
            .order_by_asc(inventory_item::Column::Qty)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// One page of inventory results plus the counts the dashboard needs to
/// render a pager.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryPage {
    pub items: Vec<InventoryItemModel>,
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
}
