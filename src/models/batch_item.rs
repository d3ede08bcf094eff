use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Reorder threshold applied when a submitted item omits or mangles the field.
pub const DEFAULT_REORDER_POINT: i32 = 10;

/// Tracked review sub-status of a single item inside a batch change.
///
/// Lives inside the `item_data` JSON of a `batch_add` record, not in its own
/// column; the reconciliation pass reads and repairs it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Canonical per-item payload of a proposed inventory change.
///
/// Dashboard submissions are loosely typed, so decoding is deliberately
/// tolerant: counts may arrive as numbers or strings, missing fields take
/// defaults, and unknown keys are ignored. Required-field enforcement happens
/// in the validator, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BatchItem {
    pub part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfg_part_number: Option<String>,
    #[serde(deserialize_with = "lenient_qty")]
    pub qty: i32,
    pub part_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(deserialize_with = "lenient_reorder_point")]
    pub reorder_point: i32,
    #[serde(deserialize_with = "lenient_item_status")]
    pub status: ItemStatus,
}

impl Default for BatchItem {
    fn default() -> Self {
        Self {
            part_number: String::new(),
            mfg_part_number: None,
            qty: 0,
            part_description: String::new(),
            supplier: None,
            location: None,
            package: None,
            reorder_point: DEFAULT_REORDER_POINT,
            status: ItemStatus::default(),
        }
    }
}

impl BatchItem {
    /// Whether a usable part number was supplied at all.
    pub fn has_part_number(&self) -> bool {
        !self.part_number.trim().is_empty()
    }

    /// Comparison form of this item's part number, see [`normalize_part_number`].
    pub fn part_number_key(&self) -> String {
        normalize_part_number(&self.part_number)
    }
}

/// Comparison form of a part number: trimmed and lowercased.
///
/// Duplicate detection is case-insensitive everywhere (validator, applier,
/// reconciliation) so the three stages agree on what counts as "the same
/// part".
pub fn normalize_part_number(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn lenient_qty<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_count(raw.as_ref(), 0))
}

fn lenient_reorder_point<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_count(raw.as_ref(), DEFAULT_REORDER_POINT))
}

fn lenient_item_status<'de, D>(deserializer: D) -> Result<ItemStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "approved" => ItemStatus::Approved,
            "rejected" => ItemStatus::Rejected,
            _ => ItemStatus::Pending,
        },
        _ => ItemStatus::Pending,
    })
}

/// Coerces a loosely typed count. Accepts integers, floats (truncated) and
/// numeric strings; anything else, and any negative value, becomes `fallback`.
fn coerce_count(raw: Option<&Value>, fallback: i32) -> i32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    match parsed {
        Some(v) if (0..=i32::MAX as i64).contains(&v) => v as i32,
        _ => fallback,
    }
}
