use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{normalize_part_number, BatchItem, ChangePayload};

/// A single problem found while normalizing a submitted change, scoped to the
/// item it was found on so the dashboard can point at the offending row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    /// Position of the item within the submitted batch (0 for single-item changes).
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    pub reason: String,
}

impl ValidationIssue {
    fn new(index: usize, part_number: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            index,
            part_number,
            reason: reason.into(),
        }
    }
}

/// Outcome of normalizing one submitted change. Issues preserve item order;
/// duplicates are reported but do not invalidate an item, missing required
/// fields do.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub valid_items: usize,
    pub total_items: usize,
}

impl ValidationReport {
    /// True when every candidate item is unusable. Submissions in this state
    /// are rejected outright instead of being parked as pending.
    pub fn all_invalid(&self) -> bool {
        self.total_items > 0 && self.valid_items == 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks a decoded change against its own contents and the current inventory
/// key set. `existing_part_numbers` holds lowercased part numbers and is
/// fetched once by the caller, not per item.
pub fn normalize(
    payload: &ChangePayload,
    existing_part_numbers: &HashSet<String>,
) -> ValidationReport {
    match payload {
        ChangePayload::Add { item } => {
            check_insert_items(std::slice::from_ref(item), existing_part_numbers)
        }
        ChangePayload::BatchAdd { items } => check_insert_items(items, existing_part_numbers),
        ChangePayload::Update { item, .. } => check_keyed_change(
            payload,
            item.as_ref(),
            "Missing part number for update",
            true,
        ),
        ChangePayload::Delete { .. } => {
            check_keyed_change(payload, None, "Missing part number for deletion", false)
        }
    }
}

// Insert-shaped changes: every item must carry a part number and description,
// and must not collide with the batch or with inventory.
fn check_insert_items(items: &[BatchItem], existing: &HashSet<String>) -> ValidationReport {
    let mut report = ValidationReport {
        total_items: items.len(),
        ..Default::default()
    };
    let mut seen_in_batch: HashSet<String> = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let mut valid = true;
        let part_number = item
            .has_part_number()
            .then(|| item.part_number.trim().to_string());

        if part_number.is_none() {
            report
                .issues
                .push(ValidationIssue::new(index, None, "Missing part number"));
            valid = false;
        }
        if item.part_description.trim().is_empty() {
            report.issues.push(ValidationIssue::new(
                index,
                part_number.clone(),
                "Missing part description",
            ));
            valid = false;
        }

        if item.has_part_number() {
            let key = item.part_number_key();
            if !seen_in_batch.insert(key.clone()) {
                report.issues.push(ValidationIssue::new(
                    index,
                    part_number.clone(),
                    "Duplicate part number in batch",
                ));
            } else if existing.contains(&key) {
                report.issues.push(ValidationIssue::new(
                    index,
                    part_number.clone(),
                    "Part number already exists in inventory",
                ));
            }
        }

        if valid {
            report.valid_items += 1;
        }
    }

    report
}

// Update/delete changes: the only hard requirement is a resolvable target
// key. Updates additionally want a description since their fields overwrite
// the stored row.
fn check_keyed_change(
    payload: &ChangePayload,
    item: Option<&BatchItem>,
    missing_key_reason: &str,
    require_description: bool,
) -> ValidationReport {
    let mut report = ValidationReport {
        total_items: 1,
        ..Default::default()
    };
    let target = payload.target_part_number();
    let mut valid = true;

    if target.is_none() {
        report
            .issues
            .push(ValidationIssue::new(0, None, missing_key_reason));
        valid = false;
    }
    if require_description {
        let described = item.map_or(false, |i| !i.part_description.trim().is_empty());
        if !described {
            report.issues.push(ValidationIssue::new(
                0,
                target.clone(),
                "Missing part description",
            ));
            valid = false;
        }
    }

    if valid {
        report.valid_items += 1;
    }
    report
}

/// Builds the lowercased lookup set the duplicate check runs against.
pub fn part_number_set<I, S>(part_numbers: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    part_numbers
        .into_iter()
        .map(|p| normalize_part_number(p.as_ref()))
        .collect()
}
