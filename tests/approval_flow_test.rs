mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::TestApp;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use stockroom_api::entities::inventory_item::Entity as InventoryItem;
use stockroom_api::entities::pending_change::{
    self, ChangeStatus, ChangeType, Entity as PendingChange,
};
use uuid::Uuid;

/// Insert a pending change directly, bypassing submission validation. Used
/// for records that intake would refuse but that can still exist in storage,
/// e.g. rows written before validation tightened.
async fn insert_raw_change(
    app: &TestApp,
    change_type: ChangeType,
    item_data: Option<serde_json::Value>,
    original_data: Option<serde_json::Value>,
) -> Uuid {
    let id = Uuid::new_v4();
    pending_change::ActiveModel {
        id: Set(id),
        change_type: Set(change_type),
        status: Set(ChangeStatus::Pending),
        item_data: Set(item_data),
        original_data: Set(original_data),
        requested_by: Set("legacy".to_string()),
        created_at: Set(Utc::now()),
        approved_by: Set(None),
        approved_at: Set(None),
    }
    .insert(app.state.db.as_ref())
    .await
    .expect("failed to insert pending change");
    id
}

#[tokio::test]
async fn approval_with_processing_lands_batch_items_in_inventory() {
    let app = TestApp::new().await;

    // Step 1: submit a two-item batch. The string qty is coerced on intake.
    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "batch_add",
                "requested_by": "dashboard",
                "item_data": {
                    "batch_items": [
                        { "part_number": "CAP-100", "part_description": "100uF capacitor", "qty": 25 },
                        { "part_number": "RES-220", "part_description": "220 ohm resistor", "qty": "40" }
                    ]
                }
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["change"]["status"], "pending");
    let change_id = body["data"]["change"]["id"]
        .as_str()
        .expect("change id in response")
        .to_string();

    // Step 2: approve with processing enabled.
    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [change_id],
                "status": "approved",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], "Updated 1 pending change(s) to approved");
    let results = body["data"]["processResults"]
        .as_array()
        .expect("process results present");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["success"], json!(true));
    assert_eq!(results[0]["message"], "applied 2/2 items");

    // Step 3: both items became inventory rows, submitted casing preserved.
    let mut parts: Vec<String> = InventoryItem::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.part_number)
        .collect();
    parts.sort();
    assert_eq!(parts, vec!["CAP-100".to_string(), "RES-220".to_string()]);

    // Step 4: the record is stamped with the approval.
    let record = PendingChange::find_by_id(Uuid::parse_str(&change_id).unwrap())
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .expect("record still present");
    assert_eq!(record.status, ChangeStatus::Approved);
    assert_eq!(record.approved_by.as_deref(), Some("dashboard"));
    assert!(record.approved_at.is_some());
}

#[tokio::test]
async fn partial_batch_failure_keeps_the_approval_and_reports_the_item() {
    let app = TestApp::new().await;
    app.seed_inventory_item("relay-5v", 10, 5).await;

    // Step 1: submit a batch where one part collides with inventory by a
    // case variant. Intake flags it but still parks the submission.
    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "batch_add",
                "requested_by": "dashboard",
                "item_data": {
                    "batch_items": [
                        { "part_number": "RELAY-5V", "part_description": "5V relay" },
                        { "part_number": "LED-RED", "part_description": "Red LED 5mm" }
                    ]
                }
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    let issues = body["data"]["validation_issues"]
        .as_array()
        .expect("validation issues reported");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["index"], 0);
    assert_eq!(issues[0]["reason"], "Part number already exists in inventory");
    let change_id = body["data"]["change"]["id"].as_str().unwrap().to_string();

    // Step 2: approve with processing. The duplicate insert fails, the other
    // item lands, and the approval itself sticks.
    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [change_id],
                "status": "approved",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let result = &body["data"]["processResults"][0];
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["message"], "applied 1/2 items");
    assert_eq!(
        result["error"],
        "RELAY-5V: Part number already exists in inventory"
    );

    let record = PendingChange::find_by_id(Uuid::parse_str(body["data"]["processResults"][0]["id"].as_str().unwrap()).unwrap())
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .expect("record still present");
    assert_eq!(record.status, ChangeStatus::Approved);

    // Step 3: the analysis endpoint reports the batch as drifted, because
    // applying never touches the stored per-item sub-statuses.
    let response = app
        .request(Method::GET, "/api/v1/fix-batch-statuses", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    let analyses = body["data"].as_array().expect("analysis array");
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0]["in_inventory"], 2);
    assert_eq!(analyses[0]["approved"], 0);
    assert_eq!(analyses[0]["needsFix"], json!(true));
}

#[tokio::test]
async fn rejection_never_touches_inventory() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "add",
                "requested_by": "dashboard",
                "item_data": { "part_number": "FUSE-2A", "part_description": "2A fuse", "qty": 100 }
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    let change_id = body["data"]["change"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [change_id],
                "status": "rejected",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["message"], "Updated 1 pending change(s) to rejected");
    // Processing only runs on approvals, so no per-item results come back.
    assert!(body["data"].get("processResults").is_none());

    let rows = InventoryItem::find().all(app.state.db.as_ref()).await.unwrap();
    assert!(rows.is_empty());

    let record = PendingChange::find_by_id(Uuid::parse_str(&change_id).unwrap())
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ChangeStatus::Rejected);
    assert!(record.approved_at.is_none());
}

#[tokio::test]
async fn keyless_delete_fails_per_item_but_the_approval_sticks() {
    let app = TestApp::new().await;

    // A delete whose data never carried a part number. Intake would refuse
    // this today, so the record is planted directly.
    let id = insert_raw_change(
        &app,
        ChangeType::Delete,
        None,
        Some(json!({ "part_description": "row with no key" })),
    )
    .await;

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [id],
                "status": "approved",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let result = &body["data"]["processResults"][0];
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], "Missing part number for deletion");

    let record = PendingChange::find_by_id(id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ChangeStatus::Approved);
}

#[tokio::test]
async fn unknown_ids_are_silently_absent_from_the_outcome() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "add",
                "requested_by": "dashboard",
                "item_data": { "part_number": "SW-TACT", "part_description": "Tactile switch" }
            })),
        )
        .await;
    let body = TestApp::body_json(response).await;
    let known = body["data"]["change"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [known, Uuid::new_v4().to_string()],
                "status": "approved",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["message"], "Updated 1 pending change(s) to approved");
    assert_eq!(
        body["data"]["processResults"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn duplicate_parts_within_one_batch_insert_at_most_once() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "batch_add",
                "requested_by": "dashboard",
                "item_data": {
                    "batch_items": [
                        { "part_number": "cap-330", "part_description": "330uF capacitor" },
                        { "part_number": "CAP-330", "part_description": "330uF capacitor, dup row" }
                    ]
                }
            })),
        )
        .await;
    let body = TestApp::body_json(response).await;
    let issues = body["data"]["validation_issues"].as_array().unwrap();
    assert_eq!(issues[0]["index"], 1);
    assert_eq!(issues[0]["reason"], "Duplicate part number in batch");
    let change_id = body["data"]["change"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({
                "ids": [change_id],
                "status": "approved",
                "processChanges": true,
                "sendNotification": false
            })),
        )
        .await;
    let body = TestApp::body_json(response).await;
    let result = &body["data"]["processResults"][0];
    assert_eq!(result["message"], "applied 1/2 items");

    let rows = InventoryItem::find().all(app.state.db.as_ref()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].part_number, "cap-330");
}

#[tokio::test]
async fn submission_with_no_usable_items_is_rejected_outright() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/pending-changes",
            Some(json!({
                "change_type": "batch_add",
                "requested_by": "dashboard",
                "item_data": { "batch_items": [ { "qty": 5 }, { "supplier": "acme" } ] }
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], "Bad Request");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("No valid items in submission"));
    assert!(message.contains("Missing part number"));

    // Nothing was parked.
    let response = app.request(Method::GET, "/api/v1/pending-changes", None).await;
    let body = TestApp::body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_ids_and_unknown_statuses_are_bad_requests() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({ "ids": [], "status": "approved" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = TestApp::body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("ids must not be empty"));

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/pending-changes",
            Some(json!({ "ids": [Uuid::new_v4().to_string()], "status": "shipped" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = TestApp::body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Invalid status: shipped"));
    assert!(message.contains("approved"));
}

#[tokio::test]
async fn bulk_delete_removes_only_the_named_records() {
    let app = TestApp::new().await;

    let mut ids = Vec::new();
    for part in ["PN-1", "PN-2", "PN-3"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/pending-changes",
                Some(json!({
                    "change_type": "add",
                    "requested_by": "dashboard",
                    "item_data": { "part_number": part, "part_description": "bulk delete probe" }
                })),
            )
            .await;
        let body = TestApp::body_json(response).await;
        ids.push(body["data"]["change"]["id"].as_str().unwrap().to_string());
    }

    let response = app
        .request(
            Method::DELETE,
            "/api/v1/pending-changes",
            Some(json!({ "ids": [ids[0], ids[1]] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::body_json(response).await;
    assert_eq!(body["message"], "Deleted 2 pending change(s)");
    assert_eq!(body["data"]["deleted"], 2);

    let response = app.request(Method::GET, "/api/v1/pending-changes", None).await;
    let body = TestApp::body_json(response).await;
    let remaining = body["data"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"].as_str().unwrap(), ids[2]);
}
