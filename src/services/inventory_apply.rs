use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_item::{self, Entity as InventoryItem};
use crate::models::{BatchItem, ChangePayload};

/// Applies one approved change to the inventory collection.
///
/// Every method returns an [`ItemResult`] rather than an error: apply
/// failures must not abort the batch loop driving them, so they are captured
/// and reported per item while siblings continue.
#[derive(Clone)]
pub struct InventoryApplyService {
    db_pool: Arc<DbPool>,
}

impl InventoryApplyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Inserts one item. No upsert: a part number already present in
    /// inventory (compared case-insensitively) is reported as a failure.
    #[instrument(skip(self, item), fields(part_number = %item.part_number))]
    pub async fn insert_item(&self, change_id: Uuid, item: &BatchItem) -> ItemResult {
        let db = self.db_pool.as_ref();

        if !item.has_part_number() {
            return ItemResult::failed(change_id, "Missing part number");
        }
        let part_number = item.part_number.trim().to_string();

        // The stored key keeps its submitted casing, so the duplicate check
        // has to lower both sides. The column's uniqueness constraint is
        // case-sensitive and only backstops exact-case races.
        let existing = InventoryItem::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(inventory_item::Column::PartNumber)))
                    .eq(item.part_number_key()),
            )
            .one(db)
            .await;
        match existing {
            Ok(Some(_)) => {
                return ItemResult::failed(change_id, "Part number already exists in inventory");
            }
            Ok(None) => {}
            Err(e) => return ItemResult::failed(change_id, e.to_string()),
        }

        let now = Utc::now();
        let row = inventory_item::ActiveModel {
            part_number: Set(part_number.clone()),
            mfg_part_number: Set(item.mfg_part_number.clone()),
            qty: Set(item.qty),
            part_description: Set(item.part_description.clone()),
            supplier: Set(item.supplier.clone()),
            location: Set(item.location.clone()),
            package: Set(item.package.clone()),
            reorder_point: Set(item.reorder_point),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match row.insert(db).await {
            Ok(_) => {
                info!("Added {} to inventory", part_number);
                ItemResult::ok(change_id, "Item added to inventory")
            }
            Err(e) => {
                warn!("Insert failed for {}: {}", part_number, e);
                ItemResult::failed(change_id, e.to_string())
            }
        }
    }

    /// Overwrites the mutable fields of the row named by the change's target
    /// part number. The key itself is never rewritten.
    #[instrument(skip(self, payload))]
    pub async fn update_item(&self, change_id: Uuid, payload: &ChangePayload) -> ItemResult {
        let db = self.db_pool.as_ref();

        let Some(part_number) = payload.target_part_number() else {
            return ItemResult::failed(change_id, "Missing part number for update");
        };
        let item = match payload {
            ChangePayload::Update {
                item: Some(item), ..
            } => item,
            _ => return ItemResult::failed(change_id, "Missing item data for update"),
        };

        let row = match InventoryItem::find_by_id(part_number.clone()).one(db).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                return ItemResult::failed(
                    change_id,
                    format!("No inventory item found for part number {}", part_number),
                );
            }
            Err(e) => return ItemResult::failed(change_id, e.to_string()),
        };

        let mut active: inventory_item::ActiveModel = row.into();
        active.mfg_part_number = Set(item.mfg_part_number.clone());
        active.qty = Set(item.qty);
        active.part_description = Set(item.part_description.clone());
        active.supplier = Set(item.supplier.clone());
        active.location = Set(item.location.clone());
        active.package = Set(item.package.clone());
        active.reorder_point = Set(item.reorder_point);
        active.updated_at = Set(Utc::now());

        match active.update(db).await {
            Ok(_) => {
                info!("Updated {} in inventory", part_number);
                ItemResult::ok(change_id, "Item updated in inventory")
            }
            Err(e) => {
                warn!("Update failed for {}: {}", part_number, e);
                ItemResult::failed(change_id, e.to_string())
            }
        }
    }

    /// Deletes the row named by the change's target part number. A key that
    /// matches no row is not an error: the row is already gone.
    #[instrument(skip(self, payload))]
    pub async fn delete_item(&self, change_id: Uuid, payload: &ChangePayload) -> ItemResult {
        let db = self.db_pool.as_ref();

        let Some(part_number) = payload.target_part_number() else {
            return ItemResult::failed(change_id, "Missing part number for deletion");
        };

        match InventoryItem::delete_by_id(part_number.clone()).exec(db).await {
            Ok(outcome) => {
                if outcome.rows_affected == 0 {
                    info!("Delete for {} matched no row", part_number);
                } else {
                    info!("Deleted {} from inventory", part_number);
                }
                ItemResult::ok(change_id, "Item deleted from inventory")
            }
            Err(e) => {
                warn!("Delete failed for {}: {}", part_number, e);
                ItemResult::failed(change_id, e.to_string())
            }
        }
    }
}

/// Outcome of applying, or notifying about, one change record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResult {
    pub id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    pub fn ok(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(id: Uuid, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Batch records report an aggregate message alongside the collected
    /// per-item failures.
    pub fn partial(id: Uuid, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            message: Some(message.into()),
            error: Some(error.into()),
        }
    }
}
