use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::inventory_item::{self, Entity as InventoryItem};
use crate::entities::pending_change::{self, ChangeStatus, ChangeType, Entity as PendingChange};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{embed_batch_items, BatchItem, ChangePayload, ItemStatus};
use crate::notifications::Notifier;
use crate::services::inventory_apply::{InventoryApplyService, ItemResult};
use crate::validation::{self, ValidationIssue};

/// Service for managing pending changes: submission, listing, bulk deletion
/// and the approval state machine.
#[derive(Clone)]
pub struct ChangeRequestService {
    db_pool: Arc<DbPool>,
    applier: InventoryApplyService,
    notifier: Arc<dyn Notifier>,
    event_sender: EventSender,
}

impl ChangeRequestService {
    pub fn new(
        db_pool: Arc<DbPool>,
        applier: InventoryApplyService,
        notifier: Arc<dyn Notifier>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db_pool,
            applier,
            notifier,
            event_sender,
        }
    }

    /// All pending changes, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<pending_change::Model>, ServiceError> {
        PendingChange::find()
            .order_by_desc(pending_change::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Records a new submission in `pending` status.
    ///
    /// The payload is decoded once and checked against the current inventory;
    /// a submission with no usable items is rejected, anything else is stored
    /// with its validation issues reported back alongside the record.
    #[instrument(skip(self, submission), fields(change_type = %submission.change_type))]
    pub async fn create(
        &self,
        submission: ChangeSubmission,
    ) -> Result<SubmissionOutcome, ServiceError> {
        submission.validate()?;
        let change_type = parse_change_type(&submission.change_type)?;
        let db = self.db_pool.as_ref();

        let payload = ChangePayload::from_parts(
            &change_type,
            submission.item_data.as_ref(),
            submission.original_data.as_ref(),
        );

        let existing: Vec<String> = InventoryItem::find()
            .select_only()
            .column(inventory_item::Column::PartNumber)
            .into_tuple()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let report = validation::normalize(&payload, &validation::part_number_set(existing));
        if report.all_invalid() {
            return Err(ServiceError::ValidationError(format!(
                "No valid items in submission: {}",
                summarize_issues(&report.issues)
            )));
        }

        // Batch items are re-embedded with their sub-status forced back to
        // pending; whatever the submitter claimed, review has not happened.
        let item_data = match &payload {
            ChangePayload::Add { item } => Some(serde_json::to_value(item)?),
            ChangePayload::BatchAdd { items } => {
                let mut stamped = items.clone();
                for item in &mut stamped {
                    item.status = ItemStatus::Pending;
                }
                Some(embed_batch_items(submission.item_data.as_ref(), &stamped))
            }
            _ => submission.item_data.clone(),
        };

        let record = pending_change::ActiveModel {
            id: Set(Uuid::new_v4()),
            change_type: Set(change_type),
            status: Set(ChangeStatus::Pending),
            item_data: Set(item_data),
            original_data: Set(submission.original_data.clone()),
            requested_by: Set(submission.requested_by.trim().to_string()),
            created_at: Set(Utc::now()),
            approved_by: Set(None),
            approved_at: Set(None),
        };
        let change = record.insert(db).await.map_err(ServiceError::db_error)?;
        info!("Recorded pending change {}", change.id);

        if let Err(e) = self.event_sender.send(Event::ChangeSubmitted(change.id)).await {
            warn!("Failed to send submission event: {}", e);
        }

        Ok(SubmissionOutcome {
            change,
            validation_issues: report.issues,
        })
    }

    /// Deletes the matched records. Unknown ids are skipped, not errors.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "ids must not be empty".to_string(),
            ));
        }

        let outcome = PendingChange::delete_many()
            .filter(pending_change::Column::Id.is_in(ids.iter().copied()))
            .exec(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!("Deleted {} pending change(s)", outcome.rows_affected);

        if outcome.rows_affected > 0 {
            if let Err(e) = self
                .event_sender
                .send(Event::ChangesDeleted(ids.to_vec()))
                .await
            {
                warn!("Failed to send deletion event: {}", e);
            }
        }
        Ok(outcome.rows_affected)
    }

    /// Bulk status transition, the approval state machine's single entry
    /// point.
    ///
    /// The status write lands on all matched records in one pass. Applying to
    /// inventory and notifying are separate follow-up steps against other
    /// collaborators; their per-record failures are collected in the outcome
    /// and never fail the call itself.
    #[instrument(skip(self, request), fields(count = request.ids.len(), status = %request.status))]
    pub async fn update_status(
        &self,
        request: StatusUpdate,
    ) -> Result<BulkStatusOutcome, ServiceError> {
        if request.ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "ids must not be empty".to_string(),
            ));
        }
        let status = parse_status(&request.status)?;
        let db = self.db_pool.as_ref();

        let matched = PendingChange::find()
            .filter(pending_change::Column::Id.is_in(request.ids.iter().copied()))
            .order_by_asc(pending_change::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut write = PendingChange::update_many()
            .filter(pending_change::Column::Id.is_in(request.ids.iter().copied()))
            .col_expr(pending_change::Column::Status, Expr::value(status.clone()));
        if status == ChangeStatus::Approved {
            let approved_by = request
                .approved_by
                .clone()
                .unwrap_or_else(|| "dashboard".to_string());
            write = write
                .col_expr(pending_change::Column::ApprovedAt, Expr::value(Utc::now()))
                .col_expr(pending_change::Column::ApprovedBy, Expr::value(approved_by));
        }
        let written = write.exec(db).await.map_err(ServiceError::db_error)?;
        info!(
            "Wrote status {} to {} pending change(s)",
            status, written.rows_affected
        );

        for record in &matched {
            let event = match status {
                ChangeStatus::Approved => Event::ChangeApproved(record.id),
                ChangeStatus::Rejected => Event::ChangeRejected(record.id),
                _ => Event::ChangeStatusUpdated {
                    change_id: record.id,
                    old_status: record.status.to_string(),
                    new_status: status.to_string(),
                },
            };
            if let Err(e) = self.event_sender.send(event).await {
                warn!("Failed to send status event: {}", e);
            }
        }

        let mut process_results = None;
        if status == ChangeStatus::Approved && request.process_changes {
            let mut results = Vec::with_capacity(matched.len());
            for record in &matched {
                results.push(self.apply_record(record).await);
            }
            process_results = Some(results);
        }

        let mut notification_results = None;
        if request.send_notification {
            let mut results = Vec::with_capacity(matched.len());
            for record in &matched {
                // The fetch predates the status write; notify with the state
                // the dashboard will see.
                let mut updated = record.clone();
                updated.status = status.clone();
                let result = match self.notifier.notify(&updated).await {
                    Ok(()) => ItemResult::ok(record.id, "Notification sent"),
                    Err(e) => {
                        warn!("Notification failed for {}: {}", record.id, e);
                        ItemResult::failed(record.id, e.to_string())
                    }
                };
                results.push(result);
            }
            notification_results = Some(results);
        }

        Ok(BulkStatusOutcome {
            message: format!(
                "Updated {} pending change(s) to {}",
                written.rows_affected, status
            ),
            process_results,
            notification_results,
        })
    }

    // Applies one approved record to inventory, expanding batch records to
    // one applier call per item. Always returns a result; apply failures are
    // data, not errors.
    async fn apply_record(&self, record: &pending_change::Model) -> ItemResult {
        let payload = ChangePayload::from_record(record);
        let (result, applied, failed) = match &payload {
            ChangePayload::Add { item } => {
                let result = self.applier.insert_item(record.id, item).await;
                let ok = result.success;
                (result, usize::from(ok), usize::from(!ok))
            }
            ChangePayload::Update { .. } => {
                let result = self.applier.update_item(record.id, &payload).await;
                let ok = result.success;
                (result, usize::from(ok), usize::from(!ok))
            }
            ChangePayload::Delete { .. } => {
                let result = self.applier.delete_item(record.id, &payload).await;
                let ok = result.success;
                (result, usize::from(ok), usize::from(!ok))
            }
            ChangePayload::BatchAdd { items } => self.apply_batch(record.id, items).await,
        };

        if let Err(e) = self
            .event_sender
            .send(Event::InventoryApplied {
                change_id: record.id,
                applied,
                failed,
            })
            .await
        {
            warn!("Failed to send apply event: {}", e);
        }
        result
    }

    // Sequential by design: per-item result order stays deterministic and the
    // store sees one write at a time.
    async fn apply_batch(
        &self,
        change_id: Uuid,
        items: &[BatchItem],
    ) -> (ItemResult, usize, usize) {
        let mut applied = 0usize;
        let mut failures: Vec<String> = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let result = self.applier.insert_item(change_id, item).await;
            if result.success {
                applied += 1;
            } else {
                let label = if item.has_part_number() {
                    item.part_number.trim().to_string()
                } else {
                    format!("item {}", index + 1)
                };
                failures.push(format!(
                    "{}: {}",
                    label,
                    result.error.unwrap_or_else(|| "unknown error".to_string())
                ));
            }
        }

        let message = format!("applied {}/{} items", applied, items.len());
        let result = if failures.is_empty() {
            ItemResult::ok(change_id, message)
        } else {
            ItemResult::partial(change_id, message, failures.join("; "))
        };
        (result, applied, failures.len())
    }
}

fn parse_status(raw: &str) -> Result<ChangeStatus, ServiceError> {
    if raw.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "status must not be empty".to_string(),
        ));
    }
    ChangeStatus::from_str(raw.trim()).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Invalid status: {}. Valid statuses are: {:?}",
            raw,
            ChangeStatus::VARIANTS
        ))
    })
}

fn parse_change_type(raw: &str) -> Result<ChangeType, ServiceError> {
    ChangeType::from_str(raw.trim()).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Invalid change type: {}. Valid types are: {:?}",
            raw,
            ChangeType::VARIANTS
        ))
    })
}

fn summarize_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("item {}: {}", issue.index, issue.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Body of `POST /pending-changes`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangeSubmission {
    /// One of `add`, `update`, `delete`, `batch_add`.
    pub change_type: String,
    #[validate(length(min = 1, message = "requested_by must not be empty"))]
    pub requested_by: String,
    pub item_data: Option<serde_json::Value>,
    pub original_data: Option<serde_json::Value>,
}

/// Body of `PATCH /pending-changes`. Field names follow the dashboard's
/// camelCase wire format.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusUpdate {
    pub ids: Vec<Uuid>,
    pub status: String,
    pub process_changes: bool,
    pub send_notification: bool,
    pub approved_by: Option<String>,
}

/// A stored submission plus whatever the validator flagged on the way in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionOutcome {
    pub change: pending_change::Model,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_issues: Vec<ValidationIssue>,
}

/// Result of a bulk status transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusOutcome {
    /// Surfaced as the envelope's top-level message, not repeated in the body.
    #[serde(skip_serializing)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_results: Option<Vec<ItemResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_results: Option<Vec<ItemResult>>,
}
