use serde_json::{Map, Value};

use super::batch_item::BatchItem;
use crate::entities::pending_change::{ChangeType, Model as PendingChange};

/// JSON key under which a batch change stores its items.
pub const BATCH_ITEMS_KEY: &str = "batch_items";

/// Canonical, decoded form of a pending change's payload.
///
/// Stored records carry loosely shaped JSON in `item_data` / `original_data`
/// (flat fields, nested objects, or an item array). Decoding happens exactly
/// once, here, so every downstream consumer works with one shape instead of
/// probing the raw documents again.
///
/// Decoding is total: a malformed fragment degrades to an absent or empty
/// item, which later fails per-item with a precise message instead of
/// aborting the whole record.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangePayload {
    Add {
        item: BatchItem,
    },
    Update {
        item: Option<BatchItem>,
        original: Option<BatchItem>,
    },
    Delete {
        item: Option<BatchItem>,
        original: Option<BatchItem>,
    },
    BatchAdd {
        items: Vec<BatchItem>,
    },
}

impl ChangePayload {
    /// Decodes a stored record into its canonical payload.
    pub fn from_record(record: &PendingChange) -> Self {
        Self::from_parts(
            &record.change_type,
            record.item_data.as_ref(),
            record.original_data.as_ref(),
        )
    }

    /// Decodes raw `item_data` / `original_data` documents before a record
    /// exists, which is how submissions are normalized on the way in.
    pub fn from_parts(
        change_type: &ChangeType,
        item_data: Option<&Value>,
        original_data: Option<&Value>,
    ) -> Self {
        let item = decode_item(item_data);
        let original = decode_item(original_data);
        match change_type {
            ChangeType::Add => Self::Add {
                item: item.unwrap_or_default(),
            },
            ChangeType::Update => Self::Update { item, original },
            ChangeType::Delete => Self::Delete { item, original },
            ChangeType::BatchAdd => Self::BatchAdd {
                items: decode_batch_items(item_data),
            },
        }
    }

    /// Inventory key for an update/delete record. The prior state in
    /// `original_data` wins; the proposed `item_data` is the fallback for
    /// legacy records that only carried the new shape.
    ///
    /// Returns `None` for add/batch payloads and for records where neither
    /// side names a part number.
    pub fn target_part_number(&self) -> Option<String> {
        let (item, original) = match self {
            Self::Update { item, original } | Self::Delete { item, original } => (item, original),
            _ => return None,
        };
        original
            .as_ref()
            .filter(|i| i.has_part_number())
            .or_else(|| item.as_ref().filter(|i| i.has_part_number()))
            .map(|i| i.part_number.trim().to_string())
    }
}

fn decode_item(raw: Option<&Value>) -> Option<BatchItem> {
    match raw {
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

fn decode_batch_items(raw: Option<&Value>) -> Vec<BatchItem> {
    let elements = match raw {
        Some(Value::Object(map)) => match map.get(BATCH_ITEMS_KEY) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        // Some early dashboard builds stored the array without the wrapper.
        Some(Value::Array(items)) => items.as_slice(),
        _ => return Vec::new(),
    };
    elements
        .iter()
        .map(|element| serde_json::from_value(element.clone()).unwrap_or_default())
        .collect()
}

/// Rewrites the `batch_items` key of an `item_data` document, preserving any
/// sibling keys stored alongside it. Used by the reconciliation pass when it
/// repairs per-item statuses.
pub fn embed_batch_items(existing: Option<&Value>, items: &[BatchItem]) -> Value {
    let mut map = match existing {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    let encoded = items
        .iter()
        .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
        .collect();
    map.insert(BATCH_ITEMS_KEY.to_string(), Value::Array(encoded));
    Value::Object(map)
}
