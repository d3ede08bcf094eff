use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Change request lifecycle events
    ChangeSubmitted(Uuid),
    ChangeApproved(Uuid),
    ChangeRejected(Uuid),
    ChangeStatusUpdated {
        change_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ChangesDeleted(Vec<Uuid>),

    // Inventory application events
    InventoryApplied {
        change_id: Uuid,
        applied: usize,
        failed: usize,
    },

    // Batch reconciliation events
    BatchStatusesRepaired {
        fixed_batches: usize,
        total_processed: usize,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Function to process incoming events and log them as they arrive.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        // Process events based on type
        match event {
            Event::ChangeApproved(change_id) => {
                if let Err(e) = handle_change_approved(change_id).await {
                    error!(
                        "Failed to handle change approved event: change_id={}, error={}",
                        change_id, e
                    );
                }
            }
            Event::ChangeRejected(change_id) => {
                info!("Change rejected: {}", change_id);
            }
            Event::ChangeStatusUpdated {
                change_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Change {} moved from {} to {}",
                    change_id, old_status, new_status
                );
            }
            Event::ChangesDeleted(change_ids) => {
                info!("Deleted {} pending change(s)", change_ids.len());
            }
            Event::InventoryApplied {
                change_id,
                applied,
                failed,
            } => {
                if let Err(e) = handle_inventory_applied(change_id, applied, failed).await {
                    error!(
                        "Failed to handle inventory applied event: change_id={}, error={}",
                        change_id, e
                    );
                }
            }
            Event::BatchStatusesRepaired {
                fixed_batches,
                total_processed,
            } => {
                info!(
                    "Batch status repair finished: {} of {} batches needed fixes",
                    fixed_batches, total_processed
                );
            }
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_change_approved(change_id: Uuid) -> Result<(), String> {
    // Approval is the point where downstream systems start caring about a
    // change, so it gets its own handler rather than the generic log line.
    info!("Processing change approved event for change {}", change_id);

    Ok(())
}

async fn handle_inventory_applied(
    change_id: Uuid,
    applied: usize,
    failed: usize,
) -> Result<(), String> {
    info!(
        "Processing inventory application result: change={}, applied={}, failed={}",
        change_id, applied, failed
    );

    if failed > 0 {
        warn!(
            "Change {} applied with {} item failure(s), the reconciliation report will pick these up",
            change_id, failed
        );
    }

    Ok(())
}
