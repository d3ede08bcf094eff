use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use stockroom_api::config::AppConfig;
use stockroom_api::db;
use stockroom_api::entities::inventory_item;
use stockroom_api::events::EventSender;
use stockroom_api::notifications::DisabledNotifier;
use stockroom_api::AppState;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Harness wiring the full application state over an in-memory SQLite
/// database, with the assembled router exposed for oneshot requests.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::establish_connection(&cfg.database_url)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, mut event_rx) = mpsc::channel(256);
        // Drain events so sends never block the tests.
        let event_task = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

        let state = AppState::new(
            db,
            cfg,
            EventSender::new(event_tx),
            Arc::new(DisabledNotifier),
        );
        let router = Router::new()
            .nest("/api/v1", stockroom_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request against the router, with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Read a response body back as JSON.
    pub async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        serde_json::from_slice(&bytes).expect("response body was not valid JSON")
    }

    /// Insert an inventory row directly, bypassing the change pipeline.
    #[allow(dead_code)]
    pub async fn seed_inventory_item(&self, part_number: &str, qty: i32, reorder_point: i32) {
        let now = Utc::now();
        inventory_item::ActiveModel {
            part_number: Set(part_number.to_string()),
            mfg_part_number: Set(None),
            qty: Set(qty),
            part_description: Set(format!("{} seed row", part_number)),
            supplier: Set(None),
            location: Set(None),
            package: Set(None),
            reorder_point: Set(reorder_point),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("failed to seed inventory item");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
