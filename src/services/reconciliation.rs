use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_item::{self, Entity as InventoryItem};
use crate::entities::pending_change::{self, ChangeStatus, ChangeType, Entity as PendingChange};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{embed_batch_items, BatchItem, ChangePayload, ItemStatus};
use crate::validation;

/// Compares what approved batches claim against what inventory actually
/// holds, and repairs the claims.
///
/// Approval's status write and the per-item inventory inserts are two
/// non-transactional steps, so their bookkeeping drifts under partial failure
/// or a crash between the steps. This service is the compensating control:
/// it never touches inventory, only the per-item sub-statuses stored in each
/// batch record's `item_data`.
#[derive(Clone)]
pub struct ReconciliationService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReconciliationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Per-batch drift report over every approved batch change, newest first.
    #[instrument(skip(self))]
    pub async fn analyze(&self) -> Result<Vec<BatchAnalysis>, ServiceError> {
        let records = self.approved_batches().await?;
        let inventory = self.inventory_part_numbers().await?;

        let mut report = Vec::with_capacity(records.len());
        for record in &records {
            let items = batch_items(record);
            let mut analysis = BatchAnalysis {
                id: record.id,
                requested_by: record.requested_by.clone(),
                created_at: record.created_at,
                total_items: items.len(),
                pending: 0,
                approved: 0,
                rejected: 0,
                in_inventory: 0,
                needs_fix: false,
            };
            for item in &items {
                match item.status {
                    ItemStatus::Pending => analysis.pending += 1,
                    ItemStatus::Approved => analysis.approved += 1,
                    ItemStatus::Rejected => analysis.rejected += 1,
                }
                if item.has_part_number() && inventory.contains(&item.part_number_key()) {
                    analysis.in_inventory += 1;
                }
            }
            analysis.needs_fix = analysis.in_inventory != analysis.approved;
            report.push(analysis);
        }

        info!(
            "Analyzed {} approved batch(es), {} need fixing",
            report.len(),
            report.iter().filter(|a| a.needs_fix).count()
        );
        Ok(report)
    }

    /// Marks each batch item `approved` wherever the item is confirmed
    /// present in inventory. Items that never made it stay as they are, so
    /// the report keeps showing them. Idempotent: a second run with no
    /// intervening changes fixes nothing.
    #[instrument(skip(self))]
    pub async fn repair(&self) -> Result<RepairSummary, ServiceError> {
        let records = self.approved_batches().await?;
        let inventory = self.inventory_part_numbers().await?;
        let db = self.db_pool.as_ref();

        let mut summary = RepairSummary {
            fixed_batches: 0,
            already_correct: 0,
            total_processed: records.len(),
        };

        for record in records {
            let mut items = batch_items(&record);
            let mut changed = false;
            for item in &mut items {
                if item.status != ItemStatus::Approved
                    && item.has_part_number()
                    && inventory.contains(&item.part_number_key())
                {
                    item.status = ItemStatus::Approved;
                    changed = true;
                }
            }

            if changed {
                let rewritten = embed_batch_items(record.item_data.as_ref(), &items);
                let id = record.id;
                let mut active: pending_change::ActiveModel = record.into();
                active.item_data = Set(Some(rewritten));
                active.update(db).await.map_err(ServiceError::db_error)?;
                info!("Repaired item sub-statuses for batch {}", id);
                summary.fixed_batches += 1;
            } else {
                summary.already_correct += 1;
            }
        }

        if let Err(e) = self
            .event_sender
            .send(Event::BatchStatusesRepaired {
                fixed_batches: summary.fixed_batches,
                total_processed: summary.total_processed,
            })
            .await
        {
            warn!("Failed to send repair event: {}", e);
        }
        Ok(summary)
    }

    async fn approved_batches(&self) -> Result<Vec<pending_change::Model>, ServiceError> {
        PendingChange::find()
            .filter(pending_change::Column::ChangeType.eq(ChangeType::BatchAdd))
            .filter(pending_change::Column::Status.eq(ChangeStatus::Approved))
            .order_by_desc(pending_change::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    // The whole key set in one read; batches are then checked in memory.
    async fn inventory_part_numbers(&self) -> Result<HashSet<String>, ServiceError> {
        let rows: Vec<String> = InventoryItem::find()
            .select_only()
            .column(inventory_item::Column::PartNumber)
            .into_tuple()
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(validation::part_number_set(rows))
    }
}

fn batch_items(record: &pending_change::Model) -> Vec<BatchItem> {
    match ChangePayload::from_record(record) {
        ChangePayload::BatchAdd { items } => items,
        _ => Vec::new(),
    }
}

/// Drift report for one approved batch change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchAnalysis {
    pub id: Uuid,
    pub requested_by: String,
    pub created_at: DateTime<Utc>,
    pub total_items: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub in_inventory: usize,
    #[serde(rename = "needsFix")]
    pub needs_fix: bool,
}

/// Result of one repair pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    pub fixed_batches: usize,
    pub already_correct: usize,
    pub total_processed: usize,
}
