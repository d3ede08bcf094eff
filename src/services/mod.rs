// Change lifecycle
pub mod change_requests;
pub mod inventory_apply;
pub mod reconciliation;

// Read-side queries
pub mod inventory;

pub use change_requests::{
    BulkStatusOutcome, ChangeRequestService, ChangeSubmission, StatusUpdate, SubmissionOutcome,
};
pub use inventory::{InventoryPage, InventoryService};
pub use inventory_apply::{InventoryApplyService, ItemResult};
pub use reconciliation::{BatchAnalysis, ReconciliationService, RepairSummary};
