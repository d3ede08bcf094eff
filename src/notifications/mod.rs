use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::AppConfig;
use crate::entities::pending_change::Model as PendingChange;
use crate::models::ChangePayload;

/// Notifier errors
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Notifier is not configured")]
    NotConfigured,
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivers a human-readable note about a reviewed change.
///
/// Failures are returned, never propagated further than the per-record
/// result: a broken webhook must not affect the approval itself.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, change: &PendingChange) -> Result<(), NotifierError>;
}

/// Posts approval notes to a Slack incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
    max_retries: u32,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            webhook_url: webhook_url.into(),
            max_retries: 3,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    #[instrument(skip(self, change), fields(change_id = %change.id))]
    async fn notify(&self, change: &PendingChange) -> Result<(), NotifierError> {
        let text = render_text(change);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self
                .client
                .post(&self.webhook_url)
                .json(&SlackMessage { text: &text })
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    debug!("Notification delivered on attempt {}", attempt);
                    return Ok(());
                }
                Ok(response) => {
                    last_error = format!("webhook returned status {}", response.status());
                    warn!("Notification attempt {} failed: {}", attempt, last_error);
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!("Notification attempt {} failed: {}", attempt, last_error);
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt - 1))).await;
            }
        }

        Err(NotifierError::Delivery(last_error))
    }
}

/// Stand-in when no webhook is configured. Reports `NotConfigured` so the
/// per-record notification result says why nothing was sent.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _change: &PendingChange) -> Result<(), NotifierError> {
        Err(NotifierError::NotConfigured)
    }
}

/// Picks the notifier implied by the configuration.
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn Notifier> {
    match config.slack_webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Arc::new(SlackNotifier::new(url)),
        _ => Arc::new(DisabledNotifier),
    }
}

#[derive(Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

fn render_text(change: &PendingChange) -> String {
    let payload = ChangePayload::from_record(change);
    let what = match &payload {
        ChangePayload::Add { item } => match item.has_part_number() {
            true => format!("add {}", item.part_number.trim()),
            false => "add (no part number)".to_string(),
        },
        ChangePayload::Update { .. } => match payload.target_part_number() {
            Some(part) => format!("update {}", part),
            None => "update (no part number)".to_string(),
        },
        ChangePayload::Delete { .. } => match payload.target_part_number() {
            Some(part) => format!("delete {}", part),
            None => "delete (no part number)".to_string(),
        },
        ChangePayload::BatchAdd { items } => format!("batch add of {} item(s)", items.len()),
    };
    format!(
        "Inventory change {}: {} (requested by {})",
        change.status, what, change.requested_by
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::pending_change::{ChangeStatus, ChangeType};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn approved_batch(requested_by: &str) -> PendingChange {
        PendingChange {
            id: Uuid::new_v4(),
            change_type: ChangeType::BatchAdd,
            status: ChangeStatus::Approved,
            item_data: Some(json!({
                "batch_items": [
                    { "part_number": "CAP-100", "part_description": "cap" },
                    { "part_number": "RES-220", "part_description": "res" },
                ]
            })),
            original_data: None,
            requested_by: requested_by.to_string(),
            created_at: Utc::now(),
            approved_by: Some("dashboard".to_string()),
            approved_at: Some(Utc::now()),
        }
    }

    #[test]
    fn renders_batch_summary_with_status_and_submitter() {
        let text = render_text(&approved_batch("dana"));
        assert_eq!(
            text,
            "Inventory change approved: batch add of 2 item(s) (requested by dana)"
        );
    }

    #[tokio::test]
    async fn delivers_text_payload_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "text": "Inventory change approved: batch add of 2 item(s) (requested by dana)"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(format!("{}/hook", server.uri()));
        notifier.notify(&approved_batch("dana")).await.unwrap();
    }

    #[tokio::test]
    async fn failed_delivery_reports_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(server.uri()).with_max_retries(1);
        let err = notifier.notify(&approved_batch("dana")).await.unwrap_err();
        assert!(matches!(err, NotifierError::Delivery(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn disabled_notifier_reports_not_configured() {
        let err = DisabledNotifier
            .notify(&approved_batch("dana"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::NotConfigured));
    }
}
