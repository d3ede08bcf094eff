pub mod batch_item;
pub mod change_payload;

pub use batch_item::{normalize_part_number, BatchItem, ItemStatus, DEFAULT_REORDER_POINT};
pub use change_payload::{embed_batch_items, ChangePayload, BATCH_ITEMS_KEY};

// Status and type enums live with the entity they are persisted on.
pub use crate::entities::pending_change::{ChangeStatus, ChangeType};
